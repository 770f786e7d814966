use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::{AnalysisError, FocusClient, FocusOutcome, FocusReading, Outcome};
use crate::capture::Sample;
use crate::http::{build_client, endpoint, error_detail, normalize_base_url};
use crate::models::SessionId;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "studysync::analysis::focus";

use crate::{log_debug, log_warn};

const FRAME_FIELD: &str = "file";
const FRAME_FILE_NAME: &str = "webcam_capture.jpeg";

#[derive(Debug, Deserialize)]
struct AnalyzeFocusResponse {
    focused: bool,
    study_state: Option<String>,
    attention_score: Option<f64>,
}

/// `POST /analyze_focus/?session_id=..` against the session backend.
#[derive(Clone)]
pub struct HttpFocusClient {
    base_url: String,
    client: Client,
}

impl HttpFocusClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client: build_client(timeout),
        }
    }

    async fn request(
        &self,
        sample: &Sample,
        session_id: &SessionId,
    ) -> Result<FocusReading, AnalysisError> {
        let part = Part::bytes(sample.frame.as_ref().clone())
            .file_name(FRAME_FILE_NAME)
            .mime_str("image/jpeg")
            .map_err(|err| AnalysisError::Encode(err.to_string()))?;
        let form = Form::new().part(FRAME_FIELD, part);

        let response = self
            .client
            .post(endpoint(&self.base_url, "/analyze_focus/"))
            .query(&[("session_id", session_id.as_str())])
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, detail) = error_detail(response).await;
            return Err(AnalysisError::HttpStatus { status, detail });
        }

        let body: AnalyzeFocusResponse = response
            .json()
            .await
            .map_err(|err| AnalysisError::Decode(err.to_string()))?;

        Ok(FocusReading {
            focused: body.focused,
            study_state: body.study_state,
            attention_score: body
                .attention_score
                .filter(|score| score.is_finite())
                .map(|score| score as f32),
        })
    }
}

#[async_trait]
impl FocusClient for HttpFocusClient {
    async fn analyze(&self, sample: &Sample, session_id: &SessionId) -> FocusOutcome {
        match self.request(sample, session_id).await {
            Ok(reading) => {
                log_debug!(
                    "session {session_id}: focused={} score={:?}",
                    reading.focused,
                    reading.attention_score
                );
                Outcome::Success(reading)
            }
            Err(err) => {
                log_warn!("focus analysis failed for session {session_id}: {err}");
                Outcome::Failure(err.to_string())
            }
        }
    }
}
