use crate::blog_post::{BlogPost, GeneratedPost, Tone};
use crate::config::Config;
use crate::error::GenerationError;
use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

const FENCE: &str = "```";

/// Anything that can turn a prompt into raw response text.
pub trait PostGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerationError>>;
}

pub fn build_prompt(topic: &str, tone: Tone) -> String {
    format!(
        r#"Write a blog post about "{topic}" with a {tone} tone.
Respond with a JSON object that has exactly these keys:
{{
    "title": "A catchy title for the post",
    "content": "The full blog post in Markdown. Use headers, lists, and bold text where they help.",
    "tags": ["tag1", "tag2", "tag3"]
}}
Return only the raw JSON. Do not wrap it in Markdown code fences such as ```json."#,
        topic = topic.trim(),
        tone = tone.as_str().to_lowercase(),
    )
}

/// Removes an enclosing fenced code block, if the service added one anyway.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(FENCE) {
        let info_end = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        text = &rest[info_end..];
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    text.trim()
}

pub fn parse_response(raw: &str) -> Result<GeneratedPost, GenerationError> {
    serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))
}

/// Runs one full attempt: prompt, call, parse, assemble. Nothing is retried.
pub async fn generate_post(
    generator: &dyn PostGenerator,
    topic: &str,
    tone: Tone,
) -> Result<BlogPost, GenerationError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(GenerationError::EmptyTopic);
    }

    let prompt = build_prompt(topic, tone);
    debug!(topic, %tone, "sending generation request");
    let raw = generator.generate(&prompt).await?;
    let parsed = parse_response(&raw).inspect_err(|e| warn!("discarding response: {}", e))?;

    let post = BlogPost::assemble(parsed, tone);
    info!(id = %post.id, title = %post.title, words = ?post.word_count, "post generated");
    Ok(post)
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Client for the Generative Language `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GenerationError::Configuration("API key not found".to_string()))?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| {
                GenerationError::Configuration(format!("failed to build http client: {}", e))
            })?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.api_base.trim_end_matches('/'),
            config.model
        );
        info!(%endpoint, "generation client ready");

        Ok(GeminiClient {
            http,
            api_key,
            endpoint,
        })
    }

    async fn request(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationError::Transport(format!(
                "service returned {}: {}",
                status,
                detail.trim()
            )));
        }

        let payload: GenerateContentResponse = response.json().await?;
        payload.into_text().ok_or_else(|| {
            GenerationError::Transport("no response from the generation service".to_string())
        })
    }
}

impl PostGenerator for GeminiClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerationError>> {
        self.request(prompt).boxed()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::blog_post::PostStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Replays a fixed outcome and counts how often it was asked.
    pub(crate) struct ScriptedGenerator {
        reply: Result<String, String>,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        pub(crate) fn replying(text: &str) -> Self {
            ScriptedGenerator {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            ScriptedGenerator {
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PostGenerator for ScriptedGenerator {
        fn generate<'a>(
            &'a self,
            _prompt: &'a str,
        ) -> BoxFuture<'a, Result<String, GenerationError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone().map_err(GenerationError::Transport);
            async move { reply }.boxed()
        }
    }

    const BODY: &str =
        r#"{"title":"Sunshine Vitamin","content":"Word1 word2 word3","tags":["health"]}"#;

    fn config_for(server: &MockServer, api_key: Option<&str>) -> Config {
        Config {
            api_key: api_key.map(str::to_string),
            api_base: server.uri(),
            ..Config::default()
        }
    }

    #[test]
    fn test_prompt_names_topic_tone_and_keys() {
        let prompt = build_prompt("  Vitamin D ", Tone::Friendly);
        assert!(prompt.contains("\"Vitamin D\""));
        assert!(prompt.contains("friendly tone"));
        for key in ["\"title\"", "\"content\"", "\"tags\""] {
            assert!(prompt.contains(key), "missing {}", key);
        }
        assert!(prompt.contains("raw JSON"));
        assert!(prompt.contains("code fences"));
    }

    #[test]
    fn test_strip_code_fences_variants() {
        assert_eq!(strip_code_fences(BODY), BODY);
        assert_eq!(strip_code_fences(&format!("```json\n{}\n```", BODY)), BODY);
        assert_eq!(strip_code_fences(&format!("```\n{}\n```\n", BODY)), BODY);
        assert_eq!(strip_code_fences(&format!("  ```{}```  ", BODY)), BODY);
    }

    #[test]
    fn test_fenced_response_parses_like_bare_body() {
        let fenced = format!("```json\n{}\n```", BODY);
        assert_eq!(parse_response(&fenced).unwrap(), parse_response(BODY).unwrap());
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = parse_response("not json").unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = parse_response(r#"{"title":"t","content":"c"}"#).unwrap_err();
        match err {
            GenerationError::MalformedResponse(msg) => assert!(msg.contains("tags")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_post_end_to_end() {
        let generator = ScriptedGenerator::replying(BODY);
        let post = generate_post(&generator, "Vitamin D", Tone::Friendly)
            .await
            .unwrap();

        assert_eq!(post.title, "Sunshine Vitamin");
        assert_eq!(post.word_count, Some(3));
        assert_eq!(post.reading_time.as_deref(), Some("< 1 min"));
        assert_eq!(post.tone, Tone::Friendly);
        assert_eq!(post.status, PostStatus::Published);
    }

    #[tokio::test]
    async fn test_generate_post_rejects_blank_topic_without_calling() {
        let generator = ScriptedGenerator::replying(BODY);
        let err = generate_post(&generator, "   ", Tone::Academic)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyTopic));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_post_propagates_transport_failure() {
        let generator = ScriptedGenerator::failing("connection reset");
        let err = generate_post(&generator, "Vitamin D", Tone::Friendly)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)));
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let config = Config {
            api_key: None,
            ..Config::default()
        };
        let err = GeminiClient::from_config(&config).err().unwrap();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_gemini_client_extracts_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-3-flash-preview:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": format!("```json\n{}\n```", BODY) }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::from_config(&config_for(&server, Some("secret"))).unwrap();
        let post = generate_post(&client, "Vitamin D", Tone::Friendly)
            .await
            .unwrap();
        assert_eq!(post.tags(), ["health".to_string()]);
    }

    #[tokio::test]
    async fn test_gemini_client_reports_server_error_as_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = GeminiClient::from_config(&config_for(&server, Some("secret"))).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        match err {
            GenerationError::Transport(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gemini_client_waits_without_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "candidates": [{ "content": { "parts": [{ "text": BODY }] } }]
                    }))
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::from_config(&config_for(&server, Some("secret"))).unwrap();
        assert_eq!(client.generate("prompt").await.unwrap(), BODY);
    }

    #[tokio::test]
    async fn test_gemini_client_honours_configured_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(BODY)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = Config {
            timeout_secs: Some(1),
            ..config_for(&server, Some("secret"))
        };
        let client = GeminiClient::from_config(&config).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)));
    }

    #[tokio::test]
    async fn test_gemini_client_empty_candidates_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = GeminiClient::from_config(&config_for(&server, Some("secret"))).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)));
    }
}
