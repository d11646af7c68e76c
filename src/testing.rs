//! Shared fixtures for the in-crate tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::elements::{ElementSource, ElementsError, FreshnessManager, TleLines};
use crate::passes::{PassCache, RefreshOrchestrator};
use crate::predict::{PassSource, PredictError, PredictedWindow, PredictionRequest, Predictor};
use crate::registry::{MissionRegistry, NewStation, SatelliteRegistry, StationRegistry};
use crate::reservations::{NewReservation, ReservationLedger, StoreCommandCatalog};
use crate::store::{GroundStation, Satellite, Store};

pub const ISS_LINE1: &str = "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
pub const ISS_LINE2: &str = "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

pub fn hours_from(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    now + Duration::hours(hours)
}

/// In-memory store with one satellite and one active station registered.
pub struct Fixture {
    pub store: Store,
    pub cache: PassCache,
    pub ledger: ReservationLedger,
    pub satellites: SatelliteRegistry,
    pub stations: StationRegistry,
    pub missions: MissionRegistry,
    pub satellite: Satellite,
    pub station: GroundStation,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Store::in_memory().await.unwrap();
        let satellites = SatelliteRegistry::new(store.clone());
        let stations = StationRegistry::new(store.clone());
        let satellite = satellites.register(25544, "ISS (ZARYA)").await.unwrap();
        let station = stations
            .register(&NewStation {
                gs_code: "TEST_GS".into(),
                lon: -105.0,
                lat: 39.0,
                alt: 1600.0,
            })
            .await
            .unwrap();

        Self {
            cache: PassCache::new(store.clone()),
            ledger: ReservationLedger::new(
                store.clone(),
                Arc::new(StoreCommandCatalog::new(store.clone())),
                Duration::seconds(2),
            ),
            missions: MissionRegistry::new(store.clone()),
            satellites,
            stations,
            satellite,
            station,
            store,
        }
    }

    pub fn s_id(&self) -> i64 {
        self.satellite.s_id
    }

    pub fn gs_id(&self) -> i64 {
        self.station.gs_id
    }

    pub async fn add_station(&self, code: &str, lon: f64, lat: f64) -> i64 {
        self.stations
            .register(&NewStation {
                gs_code: code.into(),
                lon,
                lat,
                alt: 0.0,
            })
            .await
            .unwrap()
            .gs_id
    }

    pub async fn insert_pass(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        self.insert_pass_for(self.s_id(), self.gs_id(), start, end).await
    }

    pub async fn insert_pass_for(
        &self,
        s_id: i64,
        gs_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> i64 {
        let window = PredictedWindow::new(start, end, 45.0);
        self.cache
            .upsert_pass(s_id, gs_id, &window, PassSource::N2yo)
            .await
            .unwrap()
            .expect("window should be new")
    }

    pub async fn reserve(&self, pass_id: i64) -> i64 {
        self.reserve_at(pass_id, Utc::now()).await
    }

    pub async fn reserve_at(&self, pass_id: i64, at: DateTime<Utc>) -> i64 {
        self.reserve_with_commands(pass_id, at, &[]).await
    }

    pub async fn reserve_with_commands(
        &self,
        pass_id: i64,
        at: DateTime<Utc>,
        commands: &[&str],
    ) -> i64 {
        let request = NewReservation {
            pass_id,
            mission_id: None,
            commands: commands.iter().map(|c| c.to_string()).collect(),
        };
        self.ledger.create_reservation(&request, at).await.unwrap().r_id
    }

    pub fn orchestrator(
        &self,
        predictor: Arc<dyn Predictor>,
        elements: Arc<dyn ElementSource>,
    ) -> RefreshOrchestrator {
        let timeout = std::time::Duration::from_millis(200);
        RefreshOrchestrator::new(
            self.satellites.clone(),
            self.stations.clone(),
            self.cache.clone(),
            FreshnessManager::new(self.store.clone(), elements, Duration::hours(24), timeout),
            predictor,
            timeout,
        )
    }
}

pub enum Script {
    Windows(Vec<PredictedWindow>),
    Fail,
    Hang,
}

/// Predictor that replays a script and records what it was asked.
pub struct FakePredictor {
    script: Mutex<Script>,
    requires_elements: bool,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<PredictionRequest>>,
}

impl FakePredictor {
    pub fn new(script: Script) -> Arc<Self> {
        Self::build(script, false)
    }

    pub fn with_elements(script: Script) -> Arc<Self> {
        Self::build(script, true)
    }

    fn build(script: Script, requires_elements: bool) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            requires_elements,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Predictor for FakePredictor {
    fn source(&self) -> PassSource {
        PassSource::N2yo
    }

    fn requires_elements(&self) -> bool {
        self.requires_elements
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
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let outcome = match &*self.script.lock().unwrap() {
            Script::Windows(windows) => Some(Ok(windows.clone())),
            Script::Fail => Some(Err(PredictError::Status(503))),
            Script::Hang => None,
        };
        match outcome {
            Some(result) => result,
            None => {
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                Err(PredictError::Timeout)
            }
        }
    }
}

/// Element source that always serves the ISS test elements, or always misses.
pub struct StaticElements {
    available: bool,
    pub calls: AtomicUsize,
}

impl StaticElements {
    pub fn serving() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn missing() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ElementSource for StaticElements {
    async fn fetch_elements(&self, norad_id: u32) -> Result<TleLines, ElementsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.available {
            Ok(TleLines::new(ISS_LINE1.into(), ISS_LINE2.into()))
        } else {
            Err(ElementsError::NotFound(norad_id))
        }
    }
}
