use crate::blog_post::{BlogPost, Tone};
use crate::error::GenerationError;
use crate::post_store::PostStore;
use tracing::{error, info, warn};

pub const GENERATION_FAILED: &str = "Failed to generate post. Please check your API key.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Detail(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Topic,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Generating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Input(char),
    Backspace,
    NextTone,
    PreviousTone,
    Submit,
    Up,
    Down,
    Open,
    Back,
    ToggleFocus,
    Quit,
}

/// What the event loop must send to the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub topic: String,
    pub tone: Tone,
}

pub struct App {
    store: PostStore,
    pub view: View,
    pub focus: Focus,
    pub topic: String,
    pub tone: Tone,
    pub generation: GenerationState,
    pub selected: usize,
    pub detail_scroll: u16,
    pub notice: Option<Notice>,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: PostStore) -> Self {
        let notice = store.backup_path().map(|backup| {
            Notice::Error(format!(
                "Stored posts could not be read; the old file was kept at {}",
                backup.display()
            ))
        });
        App {
            store,
            view: View::List,
            focus: Focus::Topic,
            topic: String::new(),
            tone: Tone::default(),
            generation: GenerationState::Idle,
            selected: 0,
            detail_scroll: 0,
            notice,
            should_quit: false,
        }
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    pub fn is_generating(&self) -> bool {
        self.generation == GenerationState::Generating
    }

    pub fn can_submit(&self) -> bool {
        !self.is_generating() && !self.topic.trim().is_empty()
    }

    pub fn detail_post(&self) -> Option<&BlogPost> {
        match self.view {
            View::Detail(index) => self.store.get(index),
            View::List => None,
        }
    }

    /// Applies one user action; returns a job when it started a generation.
    pub fn apply(&mut self, action: Action) -> Option<GenerationJob> {
        match action {
            Action::Input(c) => {
                self.topic.push(c);
                self.notice = None;
            }
            Action::Backspace => {
                self.topic.pop();
            }
            Action::NextTone => self.tone = self.tone.next(),
            Action::PreviousTone => self.tone = self.tone.previous(),
            Action::Submit => return self.request_generation(),
            Action::Up => match self.view {
                View::List => self.selected = self.selected.saturating_sub(1),
                View::Detail(_) => self.detail_scroll = self.detail_scroll.saturating_sub(1),
            },
            Action::Down => match self.view {
                View::List => {
                    if self.selected + 1 < self.store.len() {
                        self.selected += 1;
                    }
                }
                View::Detail(_) => self.detail_scroll = self.detail_scroll.saturating_add(1),
            },
            Action::Open => self.open_selected(),
            Action::Back => self.back(),
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Topic if !self.store.is_empty() => Focus::History,
                    _ => Focus::Topic,
                }
            }
            Action::Quit => self.should_quit = true,
        }
        None
    }

    /// Idle with a non-blank topic moves to `Generating`; anything else is a no-op.
    pub fn request_generation(&mut self) -> Option<GenerationJob> {
        if !self.can_submit() {
            return None;
        }
        self.generation = GenerationState::Generating;
        self.notice = None;
        let job = GenerationJob {
            topic: self.topic.trim().to_string(),
            tone: self.tone,
        };
        info!(topic = %job.topic, tone = %job.tone, "generation started");
        Some(job)
    }

    pub fn complete_generation(&mut self, result: Result<BlogPost, GenerationError>) {
        self.generation = GenerationState::Idle;

        let post = match result {
            Ok(post) => post,
            Err(e) => {
                error!("generation failed: {}", e);
                self.notice = Some(Notice::Error(GENERATION_FAILED.to_string()));
                return;
            }
        };

        let title = post.title.clone();
        let had_posts = !self.store.is_empty();
        let flushed = self.store.prepend(post);

        // The new post sits at index 0, so anything already pointed at moves down one.
        if let View::Detail(index) = self.view {
            self.view = View::Detail(index + 1);
        }
        if had_posts {
            self.selected += 1;
        }

        self.notice = Some(match flushed {
            Ok(()) => Notice::Info(format!("Generated \"{}\"", title)),
            Err(e) => {
                warn!(path = %self.store.path().display(), "could not save posts: {}", e);
                Notice::Error(format!("Generated \"{}\" but saving failed: {}", title, e))
            }
        });
        self.topic.clear();
    }

    fn open_selected(&mut self) {
        if self.view == View::List && self.selected < self.store.len() {
            self.view = View::Detail(self.selected);
            self.detail_scroll = 0;
        }
    }

    fn back(&mut self) {
        self.view = View::List;
        self.detail_scroll = 0;
    }
}
