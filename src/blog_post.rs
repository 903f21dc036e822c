use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const WORDS_PER_MINUTE: f64 = 200.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Professional,
    #[default]
    Friendly,
    Humorous,
    Academic,
}

impl Tone {
    pub const ALL: [Tone; 4] = [
        Tone::Professional,
        Tone::Friendly,
        Tone::Humorous,
        Tone::Academic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "Professional",
            Tone::Friendly => "Friendly",
            Tone::Humorous => "Humorous",
            Tone::Academic => "Academic",
        }
    }

    pub fn next(self) -> Tone {
        match self {
            Tone::Professional => Tone::Friendly,
            Tone::Friendly => Tone::Humorous,
            Tone::Humorous => Tone::Academic,
            Tone::Academic => Tone::Professional,
        }
    }

    pub fn previous(self) -> Tone {
        match self {
            Tone::Professional => Tone::Academic,
            Tone::Friendly => Tone::Professional,
            Tone::Humorous => Tone::Friendly,
            Tone::Academic => Tone::Humorous,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostStatus {
    Published,
    Draft,
    Generating,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PostStatus::Published => "Published",
            PostStatus::Draft => "Draft",
            PostStatus::Generating => "Generating",
        };
        f.pad(label)
    }
}

/// The three fields the generation service is asked to return.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedPost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
    pub tone: Tone,
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<String>,
}

impl BlogPost {
    /// Builds a published post from a parsed response, stamping a fresh id and today's date.
    pub fn assemble(generated: GeneratedPost, tone: Tone) -> Self {
        let words = word_count(&generated.content);
        BlogPost {
            id: Uuid::new_v4().to_string(),
            date: Local::now().date_naive(),
            title: generated.title,
            reading_time: Some(reading_time(words)),
            word_count: Some(words),
            content: generated.content,
            tone,
            status: PostStatus::Published,
            tags: Some(generated.tags),
        }
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    pub fn word_count_label(&self) -> String {
        self.word_count.unwrap_or(0).to_string()
    }

    pub fn reading_time_label(&self) -> &str {
        self.reading_time.as_deref().unwrap_or("1 min")
    }
}

pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// Rounded minutes of zero read as "< 1 min"; anything else is the ceiling.
pub fn reading_time(word_count: usize) -> String {
    let minutes = word_count as f64 / WORDS_PER_MINUTE;
    if minutes.round() == 0.0 {
        "< 1 min".to_string()
    } else {
        format!("{} min", minutes.ceil() as u64)
    }
}
