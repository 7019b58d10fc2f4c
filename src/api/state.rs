use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::{
    config::Config,
    error::AppResult,
    models::Session,
    services::{
        Catalog, CommandOutcome, ConfiguredVerifier, CoverLookup, CredentialVerifier, Library,
        LibraryCommand, OpenLibraryCovers, RecommendationClient, SeatMap, SeatSimulator,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<RwLock<Library>>,
    pub seats: Arc<RwLock<SeatMap>>,
    pub recommender: RecommendationClient,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub covers: Arc<dyn CoverLookup>,
    simulator: Arc<Mutex<Option<SeatSimulator>>>,
    seat_period: Duration,
}

impl AppState {
    /// Wires up the production collaborators from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Catalog::seeded(),
            RecommendationClient::from_config(config),
            Arc::new(ConfiguredVerifier::new(config.admin_password.clone())),
            Arc::new(OpenLibraryCovers::from_config(config)),
            Duration::from_millis(config.seat_tick_ms),
        )
    }

    pub fn new(
        catalog: Catalog,
        recommender: RecommendationClient,
        verifier: Arc<dyn CredentialVerifier>,
        covers: Arc<dyn CoverLookup>,
        seat_period: Duration,
    ) -> Self {
        Self {
            library: Arc::new(RwLock::new(Library::new(catalog))),
            seats: Arc::new(RwLock::new(SeatMap::generate(&mut fastrand::Rng::new()))),
            recommender,
            verifier,
            covers,
            simulator: Arc::new(Mutex::new(None)),
            seat_period,
        }
    }

    /// Opens a session and starts the seat simulation.
    ///
    /// The library lock is held until the simulator is running so a concurrent
    /// logout cannot leave it ticking without a session.
    pub async fn login(&self, session: Session) -> AppResult<CommandOutcome> {
        let mut library = self.library.write().await;
        let outcome = library.apply(LibraryCommand::Login(session))?;
        self.start_seat_simulation().await;
        Ok(outcome)
    }

    /// Ends the session and stops the seat simulation under the library lock
    pub async fn logout(&self) -> AppResult<CommandOutcome> {
        let mut library = self.library.write().await;
        let outcome = library.apply(LibraryCommand::Logout)?;
        self.stop_seat_simulation().await;
        Ok(outcome)
    }

    /// Starts the seat simulation unless it is already running
    pub async fn start_seat_simulation(&self) {
        let mut simulator = self.simulator.lock().await;
        if simulator.as_ref().is_some_and(SeatSimulator::is_running) {
            return;
        }
        *simulator = Some(SeatSimulator::spawn(self.seats.clone(), self.seat_period));
    }

    pub async fn stop_seat_simulation(&self) {
        let running = self.simulator.lock().await.take();
        if let Some(simulator) = running {
            simulator.stop().await;
        }
    }

    pub async fn seat_simulation_running(&self) -> bool {
        self.simulator
            .lock()
            .await
            .as_ref()
            .is_some_and(SeatSimulator::is_running)
    }
}
