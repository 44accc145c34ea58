//! AI-written summaries of a user's recent symptom logs.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Write;
use std::time::Duration;
use thiserror::Error;

use crate::models::SymptomEntry;

/// Number of newest entries handed to the model.
pub const SUMMARY_ENTRY_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Gemini API key not configured")]
    NotConfigured,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("summary service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("summary service returned no text")]
    Empty,
}

#[async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String, SummaryError>;
}

/// Builds the prompt from entries ordered newest first.
pub fn build_prompt(entries: &[SymptomEntry]) -> String {
    let mut logs = String::new();
    for (index, entry) in entries.iter().enumerate() {
        if index > 0 {
            logs.push_str("\n\n---\n\n");
        }
        let weather = match entry.temperature_c {
            Some(temperature) => format!(
                "Weather: {temperature}°C, {} humidity",
                entry
                    .humidity_pct
                    .map(|humidity| format!("{humidity}%"))
                    .unwrap_or_else(|| "unknown".to_string())
            ),
            None => "Weather: N/A".to_string(),
        };
        let _ = write!(
            logs,
            "Date: {}\nSymptom: {}\nSeverity: {}/10\n{}\nNotes: {}",
            entry.occurred_at.format("%b %-d, %Y at %-I:%M %p"),
            entry.symptom_label,
            entry.severity,
            weather,
            entry.notes.as_deref().filter(|n| !n.is_empty()).unwrap_or("None"),
        );
    }

    format!(
        "You are a medical assistant. Analyze the following symptom logs and create a concise, \
professional medical summary paragraph suitable for a doctor. Focus on:

1. Frequency and patterns of symptoms
2. Average severity levels
3. Any obvious correlations with weather conditions (temperature, humidity)
4. Notable trends or changes over time
5. Key observations from patient notes

Symptom Logs:
{logs}

Generate a clear, concise summary (2-3 paragraphs maximum) that a doctor can quickly review."
    )
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini `generateContent` client.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SummaryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl SummaryProvider for GeminiClient {
    async fn summarize(&self, prompt: &str) -> Result<String, SummaryError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SummaryError::Status {
                status: status.as_u16(),
                body: body.chars().take(256).collect(),
            });
        }

        let body: GenerateResponse = resp.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(SummaryError::Empty);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_entry(temperature_c: Option<f64>, notes: Option<&str>) -> SymptomEntry {
        let offset = FixedOffset::east_opt(0).unwrap();
        SymptomEntry {
            id: Uuid::new_v4(),
            occurred_at: offset.with_ymd_and_hms(2026, 3, 4, 15, 5, 0).unwrap(),
            symptom_label: "Migraine".to_string(),
            severity: 7,
            notes: notes.map(str::to_string),
            temperature_c,
            humidity_pct: temperature_c.map(|_| 64.0),
            weather_code: None,
        }
    }

    #[test]
    fn prompt_lists_each_entry() {
        let prompt = build_prompt(&[
            sample_entry(Some(26.5), Some("after lunch")),
            sample_entry(None, None),
        ]);
        assert!(prompt.contains("Date: Mar 4, 2026 at 3:05 PM"));
        assert!(prompt.contains("Severity: 7/10"));
        assert!(prompt.contains("Weather: 26.5°C, 64% humidity"));
        assert!(prompt.contains("Notes: after lunch"));
        assert!(prompt.contains("Weather: N/A"));
        assert!(prompt.contains("Notes: None"));
        assert_eq!(prompt.matches("\n\n---\n\n").count(), 1);
    }

    #[tokio::test]
    async fn gemini_returns_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{ "parts": [{ "text": "hello" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    {
                        "content": {
                            "parts": [{ "text": "Patient reports " }, { "text": "migraines." }]
                        }
                    }
                ]
            })))
            .mount(&server)
            .await;

        let client =
            GeminiClient::new(&server.uri(), "gemini-pro", "test-key", Duration::from_secs(5))
                .unwrap();
        let summary = client.summarize("hello").await.unwrap();
        assert_eq!(summary, "Patient reports migraines.");
    }

    #[tokio::test]
    async fn gemini_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let client =
            GeminiClient::new(&server.uri(), "gemini-pro", "k", Duration::from_secs(5)).unwrap();
        match client.summarize("hello").await {
            Err(SummaryError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
