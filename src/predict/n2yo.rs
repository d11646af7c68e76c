use async_trait::async_trait;
use chrono::{DateTime, Duration};
use serde::Deserialize;

use crate::predict::error::PredictError;
use crate::predict::types::{PassSource, PredictedWindow, PredictionRequest};
use crate::predict::Predictor;

/// Remote predictor backed by the N2YO `visualpasses` endpoint.
#[derive(Debug, Clone)]
pub struct N2yoPredictor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    min_visibility_s: u32,
}

#[derive(Debug, Deserialize)]
struct VisualPassesResponse {
    #[serde(default)]
    passes: Vec<VisualPass>,
}

#[derive(Debug, Deserialize)]
struct VisualPass {
    #[serde(rename = "startUTC")]
    start_utc: i64,
    #[serde(rename = "endUTC")]
    end_utc: i64,
    #[serde(rename = "maxEl", default)]
    max_el: f64,
}

impl N2yoPredictor {
    pub fn new(
        base_url: &str,
        api_key: &str,
        min_visibility_s: u32,
        timeout: std::time::Duration,
    ) -> Result<Self, PredictError> {
        if api_key.is_empty() {
            return Err(PredictError::NotConfigured("N2YO API key is empty".into()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            min_visibility_s,
        })
    }
}

#[async_trait]
impl Predictor for N2yoPredictor {
    fn source(&self) -> PassSource {
        PassSource::N2yo
    }

    fn requires_elements(&self) -> bool {
        false
    }

    fn refresh_horizon(&self) -> Duration {
        Duration::hours(12)
    }

    fn look_ahead(&self) -> Duration {
        Duration::days(1)
    }

    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<Vec<PredictedWindow>, PredictError> {
        let days = request.look_ahead.num_days().clamp(1, 10);
        let url = format!(
            "{}visualpasses/{}/{}/{}/{}/{}/{}",
            self.base_url,
            request.norad_id,
            request.station.latitude_deg,
            request.station.longitude_deg,
            request.station.altitude_m,
            days,
            self.min_visibility_s,
        );

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_visual_passes(&body)
    }
}

/// Converts an N2YO body (unix-second timestamps) into windows.
fn parse_visual_passes(body: &str) -> Result<Vec<PredictedWindow>, PredictError> {
    let parsed: VisualPassesResponse =
        serde_json::from_str(body).map_err(|e| PredictError::InvalidResponse(e.to_string()))?;

    parsed
        .passes
        .into_iter()
        .map(|p| {
            let start = DateTime::from_timestamp(p.start_utc, 0).ok_or_else(|| {
                PredictError::InvalidResponse(format!("bad startUTC {}", p.start_utc))
            })?;
            let end = DateTime::from_timestamp(p.end_utc, 0).ok_or_else(|| {
                PredictError::InvalidResponse(format!("bad endUTC {}", p.end_utc))
            })?;
            if end <= start {
                return Err(PredictError::InvalidResponse(format!(
                    "window ends before it starts ({} .. {})",
                    p.start_utc, p.end_utc
                )));
            }
            Ok(PredictedWindow::new(start, end, p.max_el))
        })
        .collect()
}
