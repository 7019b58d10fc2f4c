use serde::Serialize;

/// Areas of the library with their own seating
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Zone {
    #[serde(rename = "Main Reading Hall")]
    MainReadingHall,
    #[serde(rename = "Quiet Zone")]
    QuietZone,
    #[serde(rename = "Media Center")]
    MediaCenter,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::MainReadingHall, Zone::QuietZone, Zone::MediaCenter];

    /// Number of seats in the zone
    pub fn capacity(self) -> usize {
        match self {
            Zone::MainReadingHall => 60,
            Zone::QuietZone => 30,
            Zone::MediaCenter => 30,
        }
    }

    /// Probability that a seat starts out occupied
    pub fn initial_occupancy(self) -> f64 {
        match self {
            Zone::MainReadingHall => 0.4,
            Zone::QuietZone => 0.3,
            Zone::MediaCenter => 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: u32,
    pub is_occupied: bool,
    pub zone: Zone,
}

/// Free seats in one zone
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ZoneSummary {
    pub zone: Zone,
    pub total: usize,
    pub available: usize,
}
