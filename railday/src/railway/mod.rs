//! Railway network state and the per-step behaviour of stations and trains.

pub mod time;
pub mod rail;
pub mod category;
pub mod delay;
pub mod track;
pub mod schedule;
pub mod network;
pub mod dynamics;
pub mod station;
pub mod train;
pub mod context;

pub type StationId = usize;
pub type TrackId = usize;
pub type RailId = usize;
pub type CategoryId = usize;
pub type TemplateId = usize;
pub type StepId = usize;
pub type TrainId = usize;

pub use self::context::SimulationContext;

/// Unexpected states. These cannot occur with a well-formed network and abort the
/// current simulation step.
#[derive(Debug, Fail, PartialEq)]
pub enum SimulationError {
    #[fail(display = "no schedule for train {} at station {}", train, station)]
    MissingSchedule { train: String, station: String },
    #[fail(display = "train {} is not at station {}", train, station)]
    NotAtStation { train: String, station: String },
    #[fail(display = "track {} does not belong to station {}", track, station)]
    ForeignTrack { track: TrackId, station: String },
    #[fail(display = "track {} at station {} is already occupied", track, station)]
    TrackOccupied { track: TrackId, station: String },
    #[fail(display = "unknown train {}", _0)]
    UnknownTrain(TrainId),
}
