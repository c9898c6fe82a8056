//! Repository over a hosted Postgres REST endpoint (PostgREST dialect).

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use std::marker::PhantomData;
use tale_core::{DatabaseConfig, Record, Repository, StorageError};

const UPSERT_PREFER: &str = "return=representation,resolution=merge-duplicates";
const NEWEST_FIRST: &str = "created_at.desc";

pub struct PostgrestRepository<T> {
    client: Client,
    /// `{url}/rest/v1/{table}`
    endpoint: String,
    key: SecretString,
    schema: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for PostgrestRepository<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            key: self.key.clone(),
            schema: self.schema.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> PostgrestRepository<T> {
    pub fn new(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::Request(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Share one connection pool between repositories.
    pub fn with_client(client: Client, config: &DatabaseConfig) -> Self {
        let base = config.url.as_str().trim_end_matches('/');
        Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base, T::TABLE),
            key: config.key.clone(),
            schema: config.schema.clone(),
            _record: PhantomData,
        }
    }

    pub fn table(&self) -> &'static str {
        T::TABLE
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let key = self.key.expose_secret();
        self.client
            .request(method, &self.endpoint)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Accept-Profile", &self.schema)
            .header("Content-Profile", &self.schema)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StorageError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(table = T::TABLE, %status, "Storage request rejected");
        Err(StorageError::Status {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        })
    }

    async fn rows(&self, builder: RequestBuilder) -> Result<Vec<T>, StorageError> {
        let response = self.send(builder).await?;
        let body = response
            .text()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Filter columns become query keys; keep them to plain identifiers.
fn check_column(column: &str) -> Result<(), StorageError> {
    let valid = !column.is_empty()
        && column
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidRecord(format!("invalid filter column {column:?}")))
    }
}

#[async_trait]
impl<T: Record> Repository<T> for PostgrestRepository<T> {
    async fn save(&self, record: &T) -> Result<T, StorageError> {
        if record.id().trim().is_empty() {
            return Err(StorageError::InvalidRecord("record id is empty".to_string()));
        }

        let builder = self
            .request(Method::POST)
            .header("Prefer", UPSERT_PREFER)
            .json(record);
        let saved = self
            .rows(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::Decode("upsert returned no representation".to_string()))?;

        tracing::debug!(table = T::TABLE, id = saved.id(), "Record saved");
        Ok(saved)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, StorageError> {
        let builder = self
            .request(Method::GET)
            .query(&[("id", format!("eq.{id}")), ("limit", "1".to_string())]);
        Ok(self.rows(builder).await?.into_iter().next())
    }

    async fn list(&self) -> Result<Vec<T>, StorageError> {
        let builder = self
            .request(Method::GET)
            .query(&[("order", NEWEST_FIRST)]);
        self.rows(builder).await
    }

    async fn list_by(&self, column: &str, value: &str) -> Result<Vec<T>, StorageError> {
        check_column(column)?;
        let builder = self.request(Method::GET).query(&[
            (column, format!("eq.{value}")),
            ("order", NEWEST_FIRST.to_string()),
        ]);
        self.rows(builder).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let builder = self
            .request(Method::DELETE)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{id}"))]);
        let response = self.send(builder).await?;
        let body = response
            .text()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        // Representation of the removed rows; the rows themselves are not needed.
        let removed: Vec<serde_json::Value> = serde_json::from_str(&body)?;

        tracing::debug!(table = T::TABLE, id, removed = removed.len(), "Delete finished");
        Ok(!removed.is_empty())
    }
}
