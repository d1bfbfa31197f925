// Short plain-text commentary on the latest breadth readings
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use engine::config::NarrativeSettings;
use serde::{Deserialize, Serialize};
use shared::models::BreadthSnapshot;

const BROAD_PARTICIPATION: f64 = 70.0;
const WEAK_PARTICIPATION: f64 = 30.0;

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;
    async fn summarize(&self, snapshot: &BreadthSnapshot) -> Result<String>;
}

/// The text handed to a language model: one line per reading, then the instruction.
pub fn build_prompt(snapshot: &BreadthSnapshot) -> String {
    let mut prompt = format!("Market breadth for {} as of {}:\n", snapshot.market, snapshot.as_of);
    for (window, value) in &snapshot.percent_above_ma {
        match value {
            Some(v) => prompt.push_str(&format!("- % of stocks above {}D MA: {:.2}\n", window, v)),
            None => prompt.push_str(&format!("- % of stocks above {}D MA: not available\n", window)),
        }
    }
    prompt.push_str(&format!("- 52w highs minus lows: {}\n", snapshot.high_low_net));
    prompt.push_str(&format!("- Advance Decline line level: {}\n", snapshot.advance_decline));
    prompt.push_str("\nWrite a concise professional market summary. No markdown. Plain text.");
    prompt
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Pulls the first choice's text out of a chat-completions response body.
pub fn parse_completion(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body).context("Malformed chat completion response")?;
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| anyhow!("Chat completion response has no content"))?;
    if text.is_empty() {
        return Err(anyhow!("Chat completion response is empty"));
    }
    Ok(text)
}

/// Any OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionSummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatCompletionSummarizer {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// `None` when narration is disabled or the API key variable is unset.
    pub fn from_settings(settings: &NarrativeSettings) -> Result<Option<Self>> {
        if !settings.enabled {
            return Ok(None);
        }
        let api_key = match std::env::var(&settings.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                tracing::info!(var = %settings.api_key_env, "No API key set, using template summary");
                return Ok(None);
            }
        };
        Self::new(
            settings.endpoint.clone(),
            settings.model.clone(),
            api_key,
            Duration::from_secs(settings.timeout_secs),
        )
        .map(Some)
    }
}

#[async_trait]
impl Summarizer for ChatCompletionSummarizer {
    fn name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, snapshot: &BreadthSnapshot) -> Result<String> {
        let prompt = build_prompt(snapshot);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: &prompt }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Request to '{}' failed", self.endpoint))?;

        let status = response.status();
        let body = response.text().await.context("Failed to read chat completion body")?;
        if !status.is_success() {
            return Err(anyhow!("Chat completion returned {}: {}", status, body));
        }
        parse_completion(&body)
    }
}

/// Deterministic summary built from the snapshot alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateSummarizer;

impl TemplateSummarizer {
    pub fn render(&self, snapshot: &BreadthSnapshot) -> String {
        let mut lines = vec![format!("{} breadth as of {}.", snapshot.market, snapshot.as_of)];

        let readings: Vec<(usize, f64)> = snapshot
            .percent_above_ma
            .iter()
            .filter_map(|(window, value)| value.map(|v| (*window, v)))
            .collect();

        if readings.is_empty() {
            lines.push("Not enough history to compare prices with their moving averages.".to_string());
        } else {
            let parts: Vec<String> = readings
                .iter()
                .map(|(window, v)| format!("{:.2}% above the {}-day average", v, window))
                .collect();
            lines.push(format!("Constituents: {}.", parts.join(", ")));

            let average = readings.iter().map(|(_, v)| v).sum::<f64>() / readings.len() as f64;
            lines.push(
                if average >= BROAD_PARTICIPATION {
                    "Participation is broad across the index."
                } else if average <= WEAK_PARTICIPATION {
                    "Participation is weak, with most stocks below their averages."
                } else {
                    "Participation is mixed."
                }
                .to_string(),
            );
        }

        lines.push(match snapshot.high_low_net {
            n if n > 0 => format!("New 52-week highs outnumber new lows by {}.", n),
            n if n < 0 => format!("New 52-week lows outnumber new highs by {}.", -n),
            _ => "New 52-week highs and lows are balanced.".to_string(),
        });
        lines.push(format!("The advance-decline line stands at {}.", snapshot.advance_decline));

        lines.join("\n")
    }
}

#[async_trait]
impl Summarizer for TemplateSummarizer {
    fn name(&self) -> &str {
        "template"
    }

    async fn summarize(&self, snapshot: &BreadthSnapshot) -> Result<String> {
        Ok(self.render(snapshot))
    }
}

/// Asks `primary` first and falls back to the template on any failure.
pub async fn summarize_with_fallback(primary: Option<&dyn Summarizer>, snapshot: &BreadthSnapshot) -> String {
    if let Some(summarizer) = primary {
        match summarizer.summarize(snapshot).await {
            Ok(text) => {
                tracing::info!(summarizer = summarizer.name(), "Generated summary");
                return text;
            }
            Err(e) => {
                tracing::warn!(summarizer = summarizer.name(), error = %e, "Summary failed, using template");
            }
        }
    }
    TemplateSummarizer.render(snapshot)
}
