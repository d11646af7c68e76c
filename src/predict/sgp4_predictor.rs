use async_trait::async_trait;
use chrono::{Duration, SubsecRound};

use crate::predict::error::PredictError;
use crate::predict::pass_finder::find_windows;
use crate::predict::types::{PassSource, PredictedWindow, PredictionRequest};
use crate::predict::Predictor;

/// Local SGP4 propagation over the satellite's cached orbital elements.
#[derive(Debug, Clone)]
pub struct Sgp4Predictor {
    min_elevation_deg: f64,
}

impl Sgp4Predictor {
    pub fn new(min_elevation_deg: f64) -> Self {
        Self { min_elevation_deg }
    }
}

#[async_trait]
impl Predictor for Sgp4Predictor {
    fn source(&self) -> PassSource {
        PassSource::Sgp4
    }

    fn requires_elements(&self) -> bool {
        true
    }

    fn refresh_horizon(&self) -> Duration {
        Duration::hours(24)
    }

    fn look_ahead(&self) -> Duration {
        Duration::hours(48)
    }

    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<Vec<PredictedWindow>, PredictError> {
        let tle = request
            .elements
            .clone()
            .ok_or(PredictError::MissingElements(request.norad_id))?;
        let name = request.satellite_name.clone();
        let station = request.station;
        let start = request.start;
        let end = request.start + request.look_ahead;
        let min_elevation = self.min_elevation_deg;

        // Propagation is CPU bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            let (elements, constants) = tle
                .to_sgp4(Some(name))
                .map_err(|e| PredictError::InvalidElements(e.to_string()))?;
            let mut windows =
                find_windows(&station, &elements, &constants, start, end, min_elevation)?;
            // Windows cut off at either end of the span are clipped differently
            // on every call; only complete rise-to-set windows are cached.
            let last = end.trunc_subsecs(0);
            windows.retain(|w| w.start > start && w.end < last);
            Ok::<_, PredictError>(windows)
        })
        .await
        .map_err(|e| PredictError::Propagation(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::TleLines;
    use crate::predict::StationLocation;

    fn request(elements: Option<TleLines>) -> PredictionRequest {
        PredictionRequest {
            norad_id: 25544,
            satellite_name: "ISS (ZARYA)".into(),
            elements,
            station: StationLocation {
                latitude_deg: 39.0,
                longitude_deg: -105.0,
                altitude_m: 1600.0,
            },
            start: chrono::DateTime::parse_from_rfc3339("2020-07-12T21:30:00Z")
                .unwrap()
                .into(),
            look_ahead: Duration::hours(24),
        }
    }

    #[tokio::test]
    async fn missing_elements_fail_before_propagating() {
        let err = Sgp4Predictor::new(0.0).predict(&request(None)).await.unwrap_err();
        assert!(matches!(err, PredictError::MissingElements(25544)));
    }

    #[tokio::test]
    async fn garbage_elements_are_rejected() {
        let tle = TleLines::new("1 nonsense".into(), "2 nonsense".into());
        let err = Sgp4Predictor::new(0.0)
            .predict(&request(Some(tle)))
            .await
            .unwrap_err();
        assert!(matches!(err, PredictError::InvalidElements(_)));
    }

    #[tokio::test]
    async fn predicts_windows_from_elements() {
        let tle = TleLines::new(
            "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992".into(),
            "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008".into(),
        );
        let request = request(Some(tle));
        let windows = Sgp4Predictor::new(0.0).predict(&request).await.unwrap();
        assert!(!windows.is_empty());

        let end = request.start + request.look_ahead;
        assert!(windows.iter().all(|w| w.start > request.start && w.end < end));
    }
}
