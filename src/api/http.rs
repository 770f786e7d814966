use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::wire::{
    parse_server_time, EndSessionResponse, SessionMetricsResponse, SessionRow,
    StartSessionResponse,
};
use super::{ApiError, SessionApi, StartedSession};
use crate::http::{build_client, endpoint, error_detail, normalize_base_url};
use crate::models::{SessionId, SessionMetrics, SessionOverview, SessionSummary};

/// Session lifecycle over the backend's JSON API.
#[derive(Clone)]
pub struct HttpSessionApi {
    base_url: String,
    client: Client,
}

impl HttpSessionApi {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client: build_client(timeout),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            let (status, detail) = error_detail(response).await;
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn start_session(&self) -> Result<StartedSession, ApiError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, "/start_session/"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let body: StartSessionResponse = Self::decode(response).await?;

        Ok(StartedSession {
            id: body.session_id.into(),
            start_time: body.start_time.as_deref().and_then(parse_server_time),
        })
    }

    async fn end_session(&self, session_id: &SessionId) -> Result<SessionSummary, ApiError> {
        let path = format!("/end_session/{}", session_id.as_str());
        let response = self
            .client
            .post(endpoint(&self.base_url, &path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let body: EndSessionResponse = Self::decode(response).await?;
        Ok(body.into())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionOverview>, ApiError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "/sessions/"))
            .send()
            .await?;
        let rows: Vec<SessionRow> = Self::decode(response).await?;
        Ok(rows.into_iter().map(SessionOverview::from).collect())
    }

    async fn session_metrics(&self, session_id: &SessionId) -> Result<SessionMetrics, ApiError> {
        let path = format!("/session_metrics/{}", session_id.as_str());
        let response = self
            .client
            .get(endpoint(&self.base_url, &path))
            .send()
            .await?;
        let body: SessionMetricsResponse = Self::decode(response).await?;
        Ok(body.into())
    }
}
