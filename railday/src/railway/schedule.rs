use super::time::Time;
use super::{CategoryId, RailId, StationId, StepId, TemplateId, TrackId, TrainId};
use std::collections::HashSet;

/// One planned stop of a train template at a station.
///
/// No arrival time marks the origin, no departure time the terminus, and neither
/// time a station the train only passes.
#[derive(Clone, Debug)]
pub struct TrainScheduleStep {
    pub template: TemplateId,
    pub station: StationId,
    pub track: TrackId,
    pub arrival: Option<Time>,
    pub departure: Option<Time>,
    pub next_station: Option<StationId>,
    pub next_rail: Option<RailId>,
    /// Seconds, on top of the configured minimum dwell.
    pub min_dwell: i64,
    pub real_arrival: Option<Time>,
    pub real_departure: Option<Time>,
}

impl TrainScheduleStep {
    pub fn satisfied(&self) -> bool {
        self.real_departure.is_some()
    }

    pub fn is_terminal(&self) -> bool {
        self.arrival.is_some() && self.departure.is_none()
    }

    pub fn is_pass_through(&self) -> bool {
        self.arrival.is_none() && self.departure.is_none()
    }

    /// Planned time the train should be at the station, arrival first.
    pub fn planned_time(&self) -> Option<Time> {
        self.arrival.or(self.departure)
    }

    /// Planned dwell window in seconds, zero without both times.
    pub fn planned_dwell(&self) -> i64 {
        match (self.arrival, self.departure) {
            (Some(a), Some(d)) => (d - a).max(0),
            _ => 0,
        }
    }

    pub fn reset(&mut self) {
        self.real_arrival = None;
        self.real_departure = None;
    }
}

/// One-shot spawn of a template at its origin station.
#[derive(Copy, Clone, Debug)]
pub struct SpawnStep {
    pub departure: Time,
    pub track: TrackId,
}

/// Timetable identity of a train.
#[derive(Clone, Debug)]
pub struct TrainTemplate {
    pub number: u32,
    pub category: CategoryId,
    pub name: Option<String>,
    pub description: Vec<String>,
    /// Schedule steps in authored order.
    pub stops: Vec<StepId>,
    /// Stations where the timetable has rolled over into the next day.
    pub next_day_stations: HashSet<StationId>,
    /// Currently live instance.
    pub live: Option<TrainId>,
}
