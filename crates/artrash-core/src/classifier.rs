//! Gateway to the external art/junk classifier.

use crate::{ArtrashError, Result};
use artrash_types::{Classification, Confidence};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use tracing::debug;

/// Image classification collaborator.
pub trait Classify: Send + Sync {
    /// Classify one image. The returned list is ranked as the classifier
    /// ranked it; the top label is the verdict.
    fn classify(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> impl Future<Output = Result<Classification>> + Send;
}

/// Classifier gateway speaking the predictor's HTTP protocol: one POST of
/// a base64 data URI, one JSON response. Never retries, never mutates
/// state.
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
}

/// Wire shape of the predictor response: `{ "data": [ ... ] }` on
/// success, `{ "error": ... }` when the model itself failed.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    data: Option<Vec<PredictPayload>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PredictPayload {
    label: String,
    confidences: Option<Vec<Confidence>>,
}

impl HttpClassifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Classify for HttpClassifier {
    async fn classify(&self, bytes: &[u8], mime_type: &str) -> Result<Classification> {
        let body = serde_json::json!({ "data": [data_uri(bytes, mime_type)] });

        debug!(target: "artrash::classifier", mime_type, size = bytes.len(), "Sending prediction request");
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ArtrashError::Classifier(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArtrashError::Classifier(format!(
                "predictor returned {status}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ArtrashError::Classifier(format!("reading response failed: {e}")))?;
        parse_response(&text)
    }
}

/// Encode image bytes as the data URI the predictor expects.
fn data_uri(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}

/// Normalize the predictor's JSON into a tagged result.
fn parse_response(body: &str) -> Result<Classification> {
    let response: PredictResponse = serde_json::from_str(body)
        .map_err(|e| ArtrashError::Classifier(format!("malformed response: {e}")))?;

    if let Some(error) = response.error {
        return Err(ArtrashError::Classifier(format!("predictor error: {error}")));
    }

    let payload = response
        .data
        .and_then(|mut data| if data.is_empty() { None } else { Some(data.remove(0)) })
        .ok_or_else(|| ArtrashError::Classifier("response carried no prediction".to_string()))?;

    let confidences = payload
        .confidences
        .ok_or_else(|| ArtrashError::Classifier("response carried no confidences".to_string()))?;

    Ok(Classification {
        label: payload.label,
        confidences,
    })
}
