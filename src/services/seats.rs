use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{watch, RwLock},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::models::{Seat, Zone, ZoneSummary};

/// Fewest and most seats that change state per simulation tick
const MIN_CHANGES: usize = 3;
const MAX_CHANGES: usize = 6;

/// Occupancy of every seat in the library
#[derive(Debug, Clone, Default)]
pub struct SeatMap {
    seats: Vec<Seat>,
}

impl SeatMap {
    /// Lays out all zones with randomly occupied seats
    pub fn generate(rng: &mut fastrand::Rng) -> Self {
        let mut seats = Vec::new();
        let mut id = 1;

        for zone in Zone::ALL {
            for _ in 0..zone.capacity() {
                seats.push(Seat {
                    id,
                    is_occupied: rng.f64() < zone.initial_occupancy(),
                    zone,
                });
                id += 1;
            }
        }

        Self { seats }
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn total(&self) -> usize {
        self.seats.len()
    }

    pub fn available(&self) -> usize {
        self.seats.iter().filter(|s| !s.is_occupied).count()
    }

    pub fn zones(&self) -> Vec<ZoneSummary> {
        Zone::ALL
            .iter()
            .map(|&zone| {
                let in_zone = self.seats.iter().filter(|s| s.zone == zone);
                ZoneSummary {
                    zone,
                    total: in_zone.clone().count(),
                    available: in_zone.filter(|s| !s.is_occupied).count(),
                }
            })
            .collect()
    }

    /// Flips a handful of random seats. The same seat may be picked twice.
    ///
    /// Returns the number of flips performed.
    pub fn tick(&mut self, rng: &mut fastrand::Rng) -> usize {
        if self.seats.is_empty() {
            return 0;
        }

        let changes = rng.usize(MIN_CHANGES..=MAX_CHANGES);
        for _ in 0..changes {
            let index = rng.usize(..self.seats.len());
            let seat = &mut self.seats[index];
            seat.is_occupied = !seat.is_occupied;
        }
        changes
    }
}

/// Periodic background task that keeps the seat map changing
pub struct SeatSimulator {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl SeatSimulator {
    /// Starts ticking `map` every `period`. The first tick happens one period from now.
    pub fn spawn(map: Arc<RwLock<SeatMap>>, period: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut rng = fastrand::Rng::new();
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(period_ms = period.as_millis() as u64, "Seat simulation started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let mut seats = map.write().await;
                        let flips = seats.tick(&mut rng);
                        tracing::trace!(flips, available = seats.available(), "Seat occupancy updated");
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("Seat simulation stopped");
        });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the task to stop and waits for it to finish
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "Seat simulation task failed");
                }
            }
        }
    }
}

impl Drop for SeatSimulator {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
