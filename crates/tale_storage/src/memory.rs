use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tale_core::{Record, Repository, StorageError};
use tokio::sync::RwLock;

/// Process-local repository for tests and runs without a database.
///
/// Clones share the same records.
#[derive(Clone)]
pub struct InMemoryRepository<T> {
    records: Arc<RwLock<HashMap<String, T>>>,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T: Record> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn newest_first<T: Record>(mut records: Vec<T>) -> Vec<T> {
    records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    records
}

/// Compare a serialized field against a filter value the way a query string
/// would: strings by content, everything else by its JSON text.
fn column_matches(record: &serde_json::Value, column: &str, value: &str) -> bool {
    match record.get(column) {
        Some(serde_json::Value::String(s)) => s == value,
        Some(serde_json::Value::Null) | None => false,
        Some(other) => other.to_string() == value,
    }
}

#[async_trait]
impl<T: Record> Repository<T> for InMemoryRepository<T> {
    async fn save(&self, record: &T) -> Result<T, StorageError> {
        if record.id().trim().is_empty() {
            return Err(StorageError::InvalidRecord("record id is empty".to_string()));
        }
        self.records
            .write()
            .await
            .insert(record.id().to_string(), record.clone());
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, StorageError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<T>, StorageError> {
        let records = self.records.read().await.values().cloned().collect();
        Ok(newest_first(records))
    }

    async fn list_by(&self, column: &str, value: &str) -> Result<Vec<T>, StorageError> {
        let records = self.records.read().await;
        let mut matched = Vec::new();
        for record in records.values() {
            let json = serde_json::to_value(record)?;
            if column_matches(&json, column, value) {
                matched.push(record.clone());
            }
        }
        Ok(newest_first(matched))
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.records.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tale_core::{ChildProfile, Language, Story};

    fn story(id: &str, child: Option<&str>, age_minutes: i64) -> Story {
        Story {
            id: id.to_string(),
            title: format!("Story {id}"),
            content: "...".to_string(),
            moral: "honesty".to_string(),
            language: Language::Ru,
            child_id: child.map(str::to_string),
            child_name: "Lev".to_string(),
            audio_provider: None,
            model_used: "mock".to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = InMemoryRepository::<ChildProfile>::new();
        let child = ChildProfile::new("Lev", 7);
        repo.save(&child).await.unwrap();
        assert_eq!(repo.find_by_id(&child.id).await.unwrap(), Some(child));
        assert_eq!(repo.find_by_id("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_replaces_existing() {
        let repo = InMemoryRepository::<ChildProfile>::new();
        let mut child = ChildProfile::new("Lev", 7);
        repo.save(&child).await.unwrap();
        child.age = 8;
        repo.save(&child).await.unwrap();
        assert_eq!(repo.len().await, 1);
        assert_eq!(repo.find_by_id(&child.id).await.unwrap().unwrap().age, 8);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_filtered() {
        let repo = InMemoryRepository::<Story>::new();
        repo.save(&story("old", Some("c1"), 30)).await.unwrap();
        repo.save(&story("new", Some("c1"), 1)).await.unwrap();
        repo.save(&story("other", Some("c2"), 10)).await.unwrap();
        repo.save(&story("orphan", None, 5)).await.unwrap();

        let all: Vec<_> = repo.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(all, vec!["new", "orphan", "other", "old"]);

        let c1: Vec<_> = repo
            .list_by("child_id", "c1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(c1, vec!["new", "old"]);

        let ru = repo.list_by("language", "ru").await.unwrap();
        assert_eq!(ru.len(), 4);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryRepository::<Story>::new();
        repo.save(&story("s", None, 0)).await.unwrap();
        assert!(repo.delete("s").await.unwrap());
        assert!(!repo.delete("s").await.unwrap());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let repo = InMemoryRepository::<ChildProfile>::new();
        let other = repo.clone();
        repo.save(&ChildProfile::new("Ann", 4)).await.unwrap();
        assert_eq!(other.list().await.unwrap().len(), 1);
    }
}
