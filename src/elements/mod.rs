mod celestrak;
mod error;
mod freshness;
mod tle;
mod tle_directory;

use async_trait::async_trait;

pub use celestrak::{CelestrakSource, DEFAULT_CELESTRAK_URL};
pub use error::ElementsError;
pub use freshness::FreshnessManager;
pub use tle::TleLines;
pub use tle_directory::TleDirectorySource;

/// External source of current orbital elements.
#[async_trait]
pub trait ElementSource: Send + Sync {
    /// Fails with `NotFound` when no current elements exist for the catalog number.
    async fn fetch_elements(&self, norad_id: u32) -> Result<TleLines, ElementsError>;
}
