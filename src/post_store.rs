use crate::blog_post::{BlogPost, PostStatus, Tone};
use crate::error::StoreError;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the persisted payload, kept from the browser version's storage key.
pub const STORAGE_KEY: &str = "nodak_posts";

/// Newest-first post history mirrored to a JSON file after every mutation.
pub struct PostStore {
    path: PathBuf,
    posts: Vec<BlogPost>,
    backup: Option<PathBuf>,
}

impl PostStore {
    /// Reads the history; a missing or unreadable file yields the seed posts
    /// (or nothing, when `empty_fallback` is set). Invalid JSON is copied to
    /// `<path>.bak` first.
    pub fn load(path: impl Into<PathBuf>, empty_fallback: bool) -> Self {
        let path = path.into();
        let fallback = || if empty_fallback { Vec::new() } else { seed_posts() };

        let mut backup = None;
        let posts = match read_posts(&path) {
            Ok(Some(posts)) => {
                info!(key = STORAGE_KEY, count = posts.len(), path = %path.display(), "loaded posts");
                posts
            }
            Ok(None) => {
                info!(path = %path.display(), "no stored posts, starting from defaults");
                fallback()
            }
            Err(StoreError::Serialize(e)) => {
                warn!(path = %path.display(), "post store is not valid JSON: {}", e);
                backup = back_up(&path);
                fallback()
            }
            Err(e) => {
                warn!(path = %path.display(), "ignoring unreadable post store: {}", e);
                fallback()
            }
        };

        PostStore {
            path,
            posts,
            backup,
        }
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(&self.posts)?;
        fs::write(&self.path, serialized)?;
        debug!(key = STORAGE_KEY, count = self.posts.len(), "flushed posts");
        Ok(())
    }

    /// Puts `post` first and flushes. The in-memory insert stands even if the flush fails.
    pub fn prepend(&mut self, post: BlogPost) -> Result<(), StoreError> {
        self.posts.insert(0, post);
        self.save()
    }

    pub fn posts(&self) -> &[BlogPost] {
        &self.posts
    }

    pub fn get(&self, index: usize) -> Option<&BlogPost> {
        self.posts.get(index)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unparseable store file was copied before it could be overwritten.
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup.as_deref()
    }
}

fn back_up(path: &Path) -> Option<PathBuf> {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    let backup = PathBuf::from(name);

    match fs::copy(path, &backup) {
        Ok(_) => {
            info!(backup = %backup.display(), "kept a copy of the unreadable post store");
            Some(backup)
        }
        Err(e) => {
            warn!(backup = %backup.display(), "could not copy unreadable post store: {}", e);
            None
        }
    }
}

fn read_posts(path: &Path) -> Result<Option<Vec<BlogPost>>, StoreError> {
    let serialized = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&serialized)?))
}

const WINTER_POST: &str = "# Managing Diabetes in Winter

Winter brings cozy sweaters and hot cocoa, but for those managing diabetes, it also brings unique challenges. The cold weather can affect your blood sugar levels and your equipment.

## Why Winter is Tricky

1. **Less Activity**: It's cold, so we stay inside more.
2. **Comfort Food**: Higher carb intake is common.
3. **Illness**: Flu season can wreak havoc on glucose levels.

## Top Tips

* Keep your meter warm.
* Stay hydrated, even if you aren't thirsty.
* Moisturize your feet to prevent cracking.
";

const FLU_POST: &str = "# Flu Symptoms & Care

The flu hits hard and fast. Knowing the signs can help you get treatment sooner...";

/// Demo history shown on first start.
pub fn seed_posts() -> Vec<BlogPost> {
    vec![
        BlogPost {
            id: "1".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 10, 24).unwrap_or_default(),
            title: "Managing Diabetes in Winter".to_string(),
            content: WINTER_POST.to_string(),
            tone: Tone::Professional,
            status: PostStatus::Published,
            tags: Some(vec![
                "Health".to_string(),
                "Winter".to_string(),
                "Diabetes".to_string(),
            ]),
            word_count: Some(120),
            reading_time: Some("1 min".to_string()),
        },
        BlogPost {
            id: "2".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 10, 23).unwrap_or_default(),
            title: "Flu Symptoms & Care".to_string(),
            content: FLU_POST.to_string(),
            tone: Tone::Friendly,
            status: PostStatus::Draft,
            tags: Some(vec!["Flu".to_string(), "Care".to_string()]),
            word_count: Some(45),
            reading_time: Some("< 1 min".to_string()),
        },
    ]
}
