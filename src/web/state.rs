use std::sync::Arc;

use chrono::Duration;

use crate::elements::{CelestrakSource, ElementSource, FreshnessManager, TleDirectorySource};
use crate::passes::{PassCache, RefreshOrchestrator};
use crate::predict::{N2yoPredictor, Predictor, Sgp4Predictor};
use crate::registry::{MissionRegistry, SatelliteRegistry, StationRegistry};
use crate::reservations::{ReservationLedger, StoreCommandCatalog};
use crate::store::Store;

use super::config::{Config, ConfigError, ElementSourceConfig, PredictorConfig};

/// Tunables that are not tied to a particular collaborator.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub claim_grace: Duration,
    pub staleness: Duration,
    pub upstream_timeout: std::time::Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub satellites: SatelliteRegistry,
    pub stations: StationRegistry,
    pub missions: MissionRegistry,
    pub catalog: StoreCommandCatalog,
    pub ledger: ReservationLedger,
    pub orchestrator: RefreshOrchestrator,
}

impl AppState {
    pub fn new(
        store: Store,
        predictor: Arc<dyn Predictor>,
        elements: Arc<dyn ElementSource>,
        settings: Settings,
    ) -> Self {
        let satellites = SatelliteRegistry::new(store.clone());
        let stations = StationRegistry::new(store.clone());
        let catalog = StoreCommandCatalog::new(store.clone());
        let freshness = FreshnessManager::new(
            store.clone(),
            elements,
            settings.staleness,
            settings.upstream_timeout,
        );

        Self {
            orchestrator: RefreshOrchestrator::new(
                satellites.clone(),
                stations.clone(),
                PassCache::new(store.clone()),
                freshness,
                predictor,
                settings.upstream_timeout,
            ),
            ledger: ReservationLedger::new(
                store.clone(),
                Arc::new(catalog.clone()),
                settings.claim_grace,
            ),
            missions: MissionRegistry::new(store),
            satellites,
            stations,
            catalog,
        }
    }

    /// Wires the collaborators named in the configuration around an opened store.
    pub fn from_config(config: &Config, store: Store) -> Result<Self, ConfigError> {
        let timeout = config.upstream.timeout;
        let settings = Settings {
            claim_grace: to_chrono(config.reservations.claim_grace, "reservations.claim_grace")?,
            staleness: to_chrono(config.elements.staleness, "elements.staleness")?,
            upstream_timeout: timeout,
        };

        let predictor: Arc<dyn Predictor> = match &config.predictor {
            PredictorConfig::Sgp4 { min_elevation_deg } => {
                Arc::new(Sgp4Predictor::new(*min_elevation_deg))
            }
            PredictorConfig::N2yo {
                base_url,
                min_visibility_s,
                ..
            } => {
                let api_key = config.predictor.n2yo_api_key().unwrap_or_default();
                let predictor = N2yoPredictor::new(base_url, &api_key, *min_visibility_s, timeout)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?;
                Arc::new(predictor)
            }
        };

        let elements: Arc<dyn ElementSource> = match &config.elements.source {
            ElementSourceConfig::Celestrak { base_url } => Arc::new(
                CelestrakSource::new(base_url, timeout)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?,
            ),
            ElementSourceConfig::TleDirectory { folder } => {
                Arc::new(TleDirectorySource::new(folder.clone()))
            }
        };

        log::info!(
            "Using {} predictor with {:?} upstream timeout",
            predictor.source(),
            timeout
        );
        Ok(Self::new(store, predictor, elements, settings))
    }
}

fn to_chrono(duration: std::time::Duration, field: &str) -> Result<Duration, ConfigError> {
    Duration::from_std(duration).map_err(|e| ConfigError::Invalid(format!("{}: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn n2yo_without_key_is_rejected() {
        let config = Config::from_str(
            r#"
database:
  path: unused.db
predictor:
  kind: n2yo
  api_key: ""
"#,
        )
        .unwrap();
        // Only meaningful when the fallback variable is absent.
        if std::env::var(crate::web::config::N2YO_API_KEY_ENV).is_ok() {
            return;
        }

        let store = Store::in_memory().await.unwrap();
        let result = AppState::from_config(&config, store);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn sgp4_with_tle_directory_builds() {
        let config = Config::from_str(
            r#"
database:
  path: unused.db
predictor:
  kind: sgp4
  min_elevation_deg: 10
elements:
  source:
    kind: tle_directory
    folder: /nonexistent
"#,
        )
        .unwrap();

        let store = Store::in_memory().await.unwrap();
        assert!(AppState::from_config(&config, store).is_ok());
    }
}
