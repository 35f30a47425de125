//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use serde::{Deserialize, Serialize};

/// A parameter clients may send either as a JSON string or a JSON number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(serde_json::Number),
}

impl ParamValue {
    pub fn into_text(self) -> String {
        match self {
            ParamValue::Text(s) => s,
            ParamValue::Number(n) => n.to_string(),
        }
    }
}

/// process.submit.v1 - Start processing a video
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub video_file_name: String,
    #[serde(default)]
    pub target_color: Option<String>,
    #[serde(default)]
    pub threshold: Option<ParamValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: String,
}

/// process.status.v1 - Poll a job
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub job_id: String,
}

/// logs.tail.v1 - Tail a job's worker log
#[derive(Debug, Deserialize)]
pub struct TailLogsRequest {
    pub job_id: String,
    #[serde(default = "default_lines")]
    pub lines: usize,
}

fn default_lines() -> usize {
    50
}

#[derive(Debug, Clone, Serialize)]
pub struct TailLogsResponse {
    pub job_id: String,
    pub log_path: Option<String>,
    pub lines: Vec<String>,
}
