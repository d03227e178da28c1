//! Step driver and lifecycle notifications.

pub mod observable;
pub mod simulation;

pub use self::simulation::{AutoRunHandle, Simulation, SimulationState, StepOutcome, TimetableRow};
