pub mod client;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

use types::{InputTurn, MealAnalysis};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("completion output was empty")]
    EmptyOutput,
    #[error("failed to parse structured output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Stateless completion-API boundary. One free-form chat call and one
/// schema-constrained image analysis call.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, turns: Vec<InputTurn>) -> Result<String, CompletionError>;

    async fn analyze_meal_image(
        &self,
        image_base64: &str,
    ) -> Result<MealAnalysis, CompletionError>;
}

/// Accepts both a bare base64 payload and a full data URL.
pub fn strip_data_url(raw: &str) -> &str {
    match raw.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_data_url_variants() {
        assert_eq!(strip_data_url("QUJD"), "QUJD");
        assert_eq!(strip_data_url("data:image/jpeg;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("data:image/png;base64,AA=="), "AA==");
        // base64 marker without a data: prefix is left alone
        assert_eq!(strip_data_url("x;base64,QUJD"), "x;base64,QUJD");
    }
}
