use tale_core::{ChildProfile, Language};

/// Read-aloud pace used to turn minutes into a word budget.
pub const WORDS_PER_MINUTE: u32 = 150;

pub struct StoryPrompt<'a> {
    pub child: &'a ChildProfile,
    pub moral: &'a str,
    pub language: Language,
    pub minutes: u8,
}

impl<'a> StoryPrompt<'a> {
    pub fn target_words(&self) -> u32 {
        u32::from(self.minutes) * WORDS_PER_MINUTE
    }

    pub fn system(&self) -> String {
        match self.language {
            Language::En => "You are a gentle children's storyteller. Write warm, age-appropriate \
                bedtime stories with a clear moral. Never include violence or frightening scenes. \
                Put the story title alone on the first line, then a blank line, then the story."
                .to_string(),
            Language::Ru => "Ты добрый детский сказочник. Пиши тёплые сказки на ночь, подходящие \
                по возрасту, с ясной моралью. Без насилия и страшных сцен. \
                Первая строка: только название сказки, затем пустая строка, затем текст."
                .to_string(),
        }
    }

    pub fn user(&self) -> String {
        let child = self.child;
        let interests = if child.interests.is_empty() {
            None
        } else {
            Some(child.interests.join(", "))
        };

        match self.language {
            Language::En => {
                let mut prompt = format!(
                    "Write a bedtime story for {}, who is {} years old.\n",
                    child.name, child.age
                );
                if let Some(interests) = interests {
                    prompt.push_str(&format!("They love: {interests}.\n"));
                }
                prompt.push_str(&format!(
                    "The moral of the story: {}.\nLength: about {} words ({} minutes read aloud).\nWrite in English.",
                    self.moral,
                    self.target_words(),
                    self.minutes
                ));
                prompt
            }
            Language::Ru => {
                let mut prompt = format!(
                    "Напиши сказку на ночь для ребёнка по имени {}, возраст {} лет.\n",
                    child.name, child.age
                );
                if let Some(interests) = interests {
                    prompt.push_str(&format!("Интересы: {interests}.\n"));
                }
                prompt.push_str(&format!(
                    "Мораль сказки: {}.\nДлина: около {} слов ({} минут чтения вслух).\nПиши на русском языке.",
                    self.moral,
                    self.target_words(),
                    self.minutes
                ));
                prompt
            }
        }
    }
}

/// Split generated text into `(title, body)`.
///
/// The first non-empty line is the title once markdown markers, a `Title:`
/// label and wrapping quotes are stripped. Text that is a single block has no
/// title.
pub fn split_title(text: &str) -> (Option<String>, String) {
    let text = text.trim();
    let Some((first, rest)) = text.split_once('\n') else {
        return (None, text.to_string());
    };

    let body = rest.trim();
    if body.is_empty() {
        return (None, text.to_string());
    }

    let mut title = first.trim().trim_start_matches('#').trim();
    for label in ["Title:", "title:", "Название:"] {
        if let Some(stripped) = title.strip_prefix(label) {
            title = stripped.trim();
        }
    }
    let title = title.trim_matches(|c| matches!(c, '*' | '"' | '«' | '»' | '“' | '”')).trim();

    if title.is_empty() || title.chars().count() > 120 {
        return (None, text.to_string());
    }
    (Some(title.to_string()), body.to_string())
}

/// Longest prefix of `text` within `max_chars` that ends on a sentence
/// boundary, falling back to a word boundary. The flag is true when the text
/// was cut.
pub fn narration_excerpt(text: &str, max_chars: usize) -> (&str, bool) {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return (text, false);
    };
    let head = &text[..cut];
    let sentence_end = head
        .char_indices()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?' | '…'))
        .last()
        .map(|(i, c)| i + c.len_utf8());
    let end = sentence_end
        .or_else(|| head.rfind(char::is_whitespace))
        .unwrap_or(cut);

    let excerpt = head[..end].trim_end();
    if excerpt.is_empty() {
        (head, true)
    } else {
        (excerpt, true)
    }
}
