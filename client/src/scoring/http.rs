//! REST client for the scoring service

use super::ScoringService;
use crate::error::{classify_reqwest_error, RequestResult};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use workout_music_shared::types::{
    RealTimeData, RecommendationRequest, RecommendationResponse, TelemetryEnvelope,
    TrackRatingRequest,
};
use workout_music_shared::RequestError;

const RECOMMENDATIONS_PATH: &str = "api/ml-recommendations";
const HEALTH_DATA_PATH: &str = "api/health-data";
const TRACK_RATING_PATH: &str = "api/track-rating";
const REAL_TIME_DATA_PATH: &str = "api/real-time-data";
const ANALYTICS_PATH: &str = "api/analytics";

/// Scoring service client over HTTP
///
/// Every request is bounded by the configured timeout; expiry surfaces as a
/// retryable transport error.
#[derive(Clone)]
pub struct HttpScoringClient {
    base_url: Url,
    client: Client,
}

impl HttpScoringClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> RequestResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| RequestError::Config(format!("invalid service URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(RequestError::Config(format!(
                "service URL '{}' must be an absolute http(s) URL",
                base_url
            )));
        }
        // Url::join replaces the last path segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RequestError::Config(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, path: &str) -> RequestResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RequestError::Config(format!("invalid endpoint '{}': {}", path, e)))
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestResult<String> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        read_body(response).await
    }

    async fn get(&self, path: &str) -> RequestResult<String> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        read_body(response).await
    }
}

/// Read a response body, turning non-success statuses into errors
///
/// Throttling and server-side failures are transient and map to retryable
/// transport errors; any other non-success status is a protocol error.
async fn read_body(response: Response) -> RequestResult<String> {
    let status = response.status();
    let body = response.text().await.map_err(classify_reqwest_error)?;
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(RequestError::Transport {
            message: format!("service unavailable (status {})", status),
            timed_out: false,
        });
    }
    if !status.is_success() {
        return Err(RequestError::Protocol {
            message: format!("service responded with status {}", status),
            status: Some(status.as_u16()),
            raw_payload: body,
        });
    }
    Ok(body)
}

/// Decode a JSON body, keeping the raw payload on failure
fn decode<T: DeserializeOwned>(body: &str) -> RequestResult<T> {
    serde_json::from_str(body).map_err(|e| RequestError::Protocol {
        message: format!("undecodable response: {}", e),
        status: None,
        raw_payload: body.to_string(),
    })
}

#[async_trait]
impl ScoringService for HttpScoringClient {
    async fn recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> RequestResult<RecommendationResponse> {
        let body = self.post_json(RECOMMENDATIONS_PATH, request).await?;
        let response: RecommendationResponse = decode(&body)?;
        if response.is_error() {
            return Err(RequestError::Protocol {
                message: "service reported an error status".to_string(),
                status: None,
                raw_payload: body,
            });
        }
        Ok(response)
    }

    async fn submit_rating(&self, rating: &TrackRatingRequest) -> RequestResult<()> {
        self.post_json(TRACK_RATING_PATH, rating).await.map(|_| ())
    }

    async fn send_event(&self, event: &TelemetryEnvelope) -> RequestResult<()> {
        self.post_json(HEALTH_DATA_PATH, event).await.map(|_| ())
    }

    async fn real_time_data(&self) -> RequestResult<RealTimeData> {
        let body = self.get(REAL_TIME_DATA_PATH).await?;
        decode(&body)
    }

    async fn check_connectivity(&self) -> RequestResult<()> {
        self.get(ANALYTICS_PATH).await.map(|_| ())
    }
}
