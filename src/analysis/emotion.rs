use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AnalysisError, EmotionClient, EmotionOutcome, EmotionReading, Outcome};
use crate::capture::Sample;
use crate::http::{build_client, endpoint, error_detail, normalize_base_url};
use crate::models::Emotion;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "studysync::analysis::emotion";

use crate::{log_debug, log_warn};

#[derive(Debug, Serialize)]
struct PredictEmotionRequest<'a> {
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictEmotionResponse {
    emotion: String,
    confidence: f64,
    #[serde(default)]
    probabilities: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: Option<String>,
}

/// `POST /predict_emotion` against the emotion classifier.
#[derive(Clone)]
pub struct HttpEmotionClient {
    base_url: String,
    client: Client,
}

impl HttpEmotionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client: build_client(timeout),
        }
    }

    async fn request(&self, sample: &Sample) -> Result<EmotionReading, AnalysisError> {
        let data_uri = jpeg_data_uri(&sample.frame);
        let response = self
            .client
            .post(endpoint(&self.base_url, "/predict_emotion"))
            .json(&PredictEmotionRequest { image: &data_uri })
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, detail) = error_detail(response).await;
            return Err(AnalysisError::HttpStatus { status, detail });
        }

        let body: PredictEmotionResponse = response
            .json()
            .await
            .map_err(|err| AnalysisError::Decode(err.to_string()))?;
        reading_from_response(body)
    }
}

fn reading_from_response(body: PredictEmotionResponse) -> Result<EmotionReading, AnalysisError> {
    if !body.confidence.is_finite() {
        return Err(AnalysisError::Decode(format!(
            "confidence is not a number: {}",
            body.confidence
        )));
    }

    let probabilities = body
        .probabilities
        .unwrap_or_default()
        .into_iter()
        .filter(|(_, p)| p.is_finite())
        .map(|(label, p)| (label, p as f32))
        .collect();

    Ok(EmotionReading {
        emotion: Emotion::from_label(&body.emotion),
        label: body.emotion,
        confidence: (body.confidence as f32).clamp(0.0, 1.0),
        probabilities,
    })
}

pub fn jpeg_data_uri(frame: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(frame))
}

#[async_trait]
impl EmotionClient for HttpEmotionClient {
    async fn classify(&self, sample: &Sample) -> EmotionOutcome {
        match self.request(sample).await {
            Ok(reading) => {
                if reading.emotion.is_none() {
                    log_warn!("classifier returned unrecognized label '{}'", reading.label);
                }
                log_debug!("emotion={} confidence={:.2}", reading.label, reading.confidence);
                Outcome::Success(reading)
            }
            Err(err) => {
                log_warn!("emotion classification failed: {err}");
                Outcome::Failure(err.to_string())
            }
        }
    }

    async fn health(&self) -> Result<(), AnalysisError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "/health"))
            .send()
            .await?;
        if !response.status().is_success() {
            let (status, detail) = error_detail(response).await;
            return Err(AnalysisError::HttpStatus { status, detail });
        }

        let body: HealthResponse = response
            .json()
            .await
            .map_err(|err| AnalysisError::Decode(err.to_string()))?;
        match body.status.as_deref() {
            Some("healthy") | None => Ok(()),
            Some(other) => Err(AnalysisError::Decode(format!("service reports '{other}'"))),
        }
    }
}
