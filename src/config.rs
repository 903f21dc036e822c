use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_STORE_FILE: &str = "blog_posts.json";
pub const DEFAULT_LOG_FILE: &str = "blog_generator.log";

#[derive(Debug, Parser)]
#[command(name = "blog_generator", version, about = "Generate blog posts with Gemini from your terminal")]
pub struct Cli {
    /// JSON file that holds the post history
    #[arg(long, env = "BLOG_STORE", default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,

    /// Model used for generation
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, env = "BLOG_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Give up on a generation request after this many seconds (waits indefinitely when unset)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// Start with no posts instead of the demo posts when the store file is missing
    #[arg(long)]
    pub empty_store: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub store_path: PathBuf,
    pub log_file: PathBuf,
    pub timeout_secs: Option<u64>,
    pub empty_store: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            timeout_secs: None,
            empty_store: false,
        }
    }
}

impl Config {
    pub fn from_cli(cli: Cli) -> Self {
        let api_key = resolve_api_key(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("API_KEY").ok(),
        );
        Config {
            api_key,
            model: cli.model,
            api_base: cli.api_base,
            store_path: cli.store,
            log_file: cli.log_file,
            timeout_secs: cli.timeout_secs,
            empty_store: cli.empty_store,
        }
    }
}

/// `GEMINI_API_KEY` wins over the legacy `API_KEY`; blank values count as unset.
fn resolve_api_key(primary: Option<String>, legacy: Option<String>) -> Option<String> {
    [primary, legacy]
        .into_iter()
        .flatten()
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}
