use async_trait::async_trait;

use crate::elements::error::ElementsError;
use crate::elements::tle::{parse_multi_tle, TleLines};
use crate::elements::ElementSource;

pub const DEFAULT_CELESTRAK_URL: &str = "https://celestrak.org/NORAD/elements/gp.php";

/// Fetches current two-line elements from the CelesTrak GP endpoint.
#[derive(Debug, Clone)]
pub struct CelestrakSource {
    client: reqwest::Client,
    base_url: String,
}

impl CelestrakSource {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, ElementsError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl ElementSource for CelestrakSource {
    async fn fetch_elements(&self, norad_id: u32) -> Result<TleLines, ElementsError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("CATNR", norad_id.to_string()), ("FORMAT", "2LE".to_string())])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ElementsError::NotFound(norad_id));
        }
        if !status.is_success() {
            return Err(ElementsError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        first_tle(&body).ok_or_else(|| {
            log::error!("CelesTrak returned no TLE for NORAD {}", norad_id);
            ElementsError::NotFound(norad_id)
        })
    }
}

/// CelesTrak answers unknown catalog numbers with a plain-text notice instead of a 404.
fn first_tle(body: &str) -> Option<TleLines> {
    parse_multi_tle(body).into_iter().next().map(|(_, lines)| lines)
}
