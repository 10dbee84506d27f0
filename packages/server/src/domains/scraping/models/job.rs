use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound job description from `POST /scrape-emails`.
///
/// Every field defaults when absent. `names`, `domain` and `niche` are opaque
/// to the server: whatever shape the caller sends (a list of names or one
/// comma separated string) is handed to the worker as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobRequest {
    /// Opaque caller identifier, echoed back verbatim in the callback
    pub record_id: Value,
    pub names: Value,
    pub domain: Value,
    pub niche: Value,
    pub webhook: String,
}

impl JobRequest {
    /// Record identifier rendered for logs (strings without quotes)
    pub fn record_label(&self) -> String {
        match &self.record_id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Number of names in the job, counting a comma separated string per entry
    pub fn name_count(&self) -> usize {
        match &self.names {
            Value::Null => 0,
            Value::Array(names) => names.len(),
            Value::String(names) => names.split(',').filter(|n| !n.trim().is_empty()).count(),
            _ => 1,
        }
    }
}

/// The part of a job the worker reads from `config.json`.
///
/// Fields the caller left out are omitted from the file rather than written
/// as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    #[serde(skip_serializing_if = "Value::is_null")]
    pub names: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub domain: Value,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub niche: Value,
}

impl From<&JobRequest> for JobConfig {
    fn from(request: &JobRequest) -> Self {
        Self {
            names: request.names.clone(),
            domain: request.domain.clone(),
            niche: request.niche.clone(),
        }
    }
}

/// Body POSTed to the caller's webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub record_id: serde_json::Value,
    pub emails: Vec<String>,
}

/// Parse the worker's result file: one address per line, whitespace trimmed,
/// blank lines dropped. Order and duplicates are kept.
pub fn parse_email_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
