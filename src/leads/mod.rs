//! Lead-search API client
//!
//! Consumes the third-party scraper's server-sent-event stream. Each `data:`
//! line carries a JSON payload: either a batch of freshly scraped company
//! records or a completion notice. Batches are handed to a caller-supplied
//! callback as they arrive so results can render incrementally.
//!
//! A line that fails JSON parsing is skipped and logged; the stream keeps
//! going. Only transport-level failures abort the search.

use crate::{log_debug, log_warn};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Substring marking the stream's completion payload
const COMPLETION_MARKER: &str = "Scraping completed";

/// Lead-stream errors
#[derive(Debug, Error)]
pub enum LeadError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Lead API returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// One scraped company record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeadRecord {
    #[serde(rename = "Company")]
    pub company: String,

    #[serde(rename = "Industry", default)]
    pub industry: Option<String>,

    #[serde(rename = "Street", default)]
    pub street: Option<String>,

    #[serde(rename = "City", default)]
    pub city: Option<String>,

    #[serde(rename = "State", default)]
    pub state: Option<String>,

    #[serde(rename = "Business_phone", default)]
    pub business_phone: Option<String>,

    #[serde(rename = "Website", default)]
    pub website: Option<String>,
}

/// Parsed stream event
#[derive(Debug, Clone, PartialEq)]
pub enum LeadEvent {
    /// A batch of new records plus the running total
    Batch {
        items: Vec<LeadRecord>,
        total_scraped: u64,
    },
    /// Final completion notice
    Completed {
        total_scraped: u64,
        elapsed_time: f64,
    },
}

/// Raw shape of one `data:` payload; the two event kinds share a JSON object
#[derive(Deserialize)]
struct RawEvent {
    #[serde(default)]
    new_items: Option<Vec<LeadRecord>>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    total_scraped: Option<u64>,
    #[serde(default)]
    elapsed_time: Option<f64>,
}

/// Parse one stream line into an event.
///
/// Returns `None` for non-data lines, malformed JSON (skipped per policy)
/// and payloads that are neither a batch nor a completion.
pub fn parse_event(line: &str) -> Option<LeadEvent> {
    let payload = line.strip_prefix("data:")?.trim();

    let raw: RawEvent = match serde_json::from_str(payload) {
        Ok(raw) => raw,
        Err(e) => {
            log_warn!("Skipping malformed stream line: {}", e);
            return None;
        }
    };

    if let Some(items) = raw.new_items {
        return Some(LeadEvent::Batch {
            items,
            total_scraped: raw.total_scraped.unwrap_or(0),
        });
    }

    match raw.message {
        Some(ref message) if message.contains(COMPLETION_MARKER) => Some(LeadEvent::Completed {
            total_scraped: raw.total_scraped.unwrap_or(0),
            elapsed_time: raw.elapsed_time.unwrap_or(0.0),
        }),
        _ => None,
    }
}

/// Streaming client for the lead-search API
pub struct LeadClient {
    client: reqwest::Client,
    url: String,
}

impl LeadClient {
    pub fn new(url: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self { client, url }
    }

    /// Stream leads for an industry/location pair.
    ///
    /// `on_event` fires for every batch as it arrives. Returns the completion
    /// notice if the stream delivered one; `None` means the stream ended
    /// without confirmation.
    pub async fn stream(
        &self,
        industry: &str,
        location: &str,
        mut on_event: impl FnMut(&LeadEvent),
    ) -> Result<Option<LeadEvent>, LeadError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("industry", industry), ("location", location)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LeadError::Status(response.status()));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut completion = None;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // Drain complete lines, keep the trailing partial one buffered
            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match parse_event(line) {
                    Some(event @ LeadEvent::Batch { .. }) => on_event(&event),
                    Some(event @ LeadEvent::Completed { .. }) => {
                        log_debug!("Stream completion received");
                        completion = Some(event);
                    }
                    None => {}
                }
            }
        }

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_event() {
        let line = r#"data: {"new_items": [{"Company": "Acme Mining", "Industry": "mining", "City": "Sudbury", "Website": "http://acme.example"}], "total_scraped": 12}"#;

        match parse_event(line) {
            Some(LeadEvent::Batch {
                items,
                total_scraped,
            }) => {
                assert_eq!(total_scraped, 12);
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].company, "Acme Mining");
                assert_eq!(items[0].city.as_deref(), Some("Sudbury"));
                assert!(items[0].street.is_none());
            }
            other => panic!("expected batch, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_completion_event() {
        let line = r#"data: {"message": "Scraping completed successfully", "total_scraped": 47, "elapsed_time": 12.5}"#;

        match parse_event(line) {
            Some(LeadEvent::Completed {
                total_scraped,
                elapsed_time,
            }) => {
                assert_eq!(total_scraped, 47);
                assert!((elapsed_time - 12.5).abs() < f64::EPSILON);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        assert!(parse_event("data: {not json at all").is_none());
    }

    #[test]
    fn test_non_data_lines_ignored() {
        assert!(parse_event(": keep-alive").is_none());
        assert!(parse_event("event: update").is_none());
        assert!(parse_event("").is_none());
    }

    #[test]
    fn test_unrelated_message_ignored() {
        let line = r#"data: {"message": "still warming up"}"#;
        assert!(parse_event(line).is_none());
    }

    #[test]
    fn test_missing_optional_fields_absorbed() {
        let line = r#"data: {"new_items": [{"Company": "Bare Minimum LLC"}]}"#;
        match parse_event(line) {
            Some(LeadEvent::Batch {
                items,
                total_scraped,
            }) => {
                assert_eq!(total_scraped, 0);
                assert!(items[0].website.is_none());
                assert!(items[0].business_phone.is_none());
            }
            other => panic!("expected batch, got {:?}", other),
        }
    }
}
