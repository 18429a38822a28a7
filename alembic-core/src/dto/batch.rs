//! Batch wire records
//!
//! One request record per work item is written to the chunk's JSONL
//! payload; one result record per line comes back in the completed job's
//! output artifact.

use serde::{Deserialize, Serialize};

use crate::domain::item::CustomId;

/// One turn of the two-part prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Model and inference parameters for one request.
///
/// `temperature` and `max_output_tokens` are pass-through configuration:
/// they are serialized verbatim and the service makes no guarantee about
/// honoring them for batch jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub input: Vec<PromptMessage>,
}

/// One line of a chunk's request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub custom_id: CustomId,
    pub method: String,
    pub url: String,
    pub body: RequestBody,
}

impl RequestRecord {
    pub fn new(custom_id: CustomId, url: impl Into<String>, body: RequestBody) -> Self {
        Self {
            custom_id,
            method: "POST".to_string(),
            url: url.into(),
            body,
        }
    }
}

/// One line of a completed job's output artifact
#[derive(Debug, Clone, Deserialize)]
pub struct ResultRecord {
    pub custom_id: CustomId,
    pub response: ResultResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultResponse {
    pub body: InferenceResponse,
}

/// Response body shared by the batch artifact and the per-item endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceResponse {
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<OutputContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl InferenceResponse {
    /// Concatenates every fragment marked as primary textual output.
    ///
    /// Reasoning items, refusals and other content kinds are skipped.
    pub fn output_text(&self) -> String {
        let mut text = String::new();
        for item in &self.output {
            for fragment in &item.content {
                if fragment.kind == "output_text" {
                    text.push_str(&fragment.text);
                }
            }
        }
        text
    }
}

impl ResultRecord {
    /// The record's concatenated primary textual output
    pub fn output_text(&self) -> String {
        self.response.body.output_text()
    }
}
