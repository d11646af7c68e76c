mod error;
mod geometry;
mod n2yo;
mod pass_finder;
mod sgp4_predictor;
mod types;

use async_trait::async_trait;
use chrono::Duration;

pub use error::PredictError;
pub use geometry::StationLocation;
pub use n2yo::N2yoPredictor;
pub use sgp4_predictor::Sgp4Predictor;
pub use types::{PassSource, PredictedWindow, PredictionRequest};

/// Source of visibility windows for a (satellite, station) pair.
///
/// A call is all-or-nothing: either the full list of windows for the requested
/// look-ahead comes back, or an error does.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Tag stored with every window this predictor produces.
    fn source(&self) -> PassSource;

    /// Whether `PredictionRequest::elements` must be present and fresh.
    fn requires_elements(&self) -> bool;

    /// The cache is stale when its furthest window ends before `now + refresh_horizon`.
    fn refresh_horizon(&self) -> Duration;

    /// How far ahead a single call predicts.
    fn look_ahead(&self) -> Duration;

    async fn predict(&self, request: &PredictionRequest)
        -> Result<Vec<PredictedWindow>, PredictError>;
}
