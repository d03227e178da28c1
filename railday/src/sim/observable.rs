use crate::railway::time::Time;
use crate::railway::{SimulationContext, StationId, TrackId, TrainId};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SimulationEvent {
    TrainAdded(TrainId),
    TrainRemoved(TrainId),
    TrainArrived { train: TrainId, station: StationId, track: TrackId },
    TrainDeparted { train: TrainId, station: StationId, track: TrackId },
    StepCompleted(Time),
    Reset,
}

/// Called synchronously, in emission order, with read access to the simulation.
pub type Listener = Box<dyn FnMut(&SimulationEvent, &SimulationContext)>;

pub type ListenerId = usize;

#[derive(Default)]
pub struct Observers {
    listeners: Vec<(ListenerId, Listener)>,
    id_counter: ListenerId,
}

impl Observers {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = self.id_counter;
        self.id_counter += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|&(l, _)| l != id);
    }

    pub fn notify(&mut self, event: &SimulationEvent, ctx: &SimulationContext) {
        for &mut (_, ref mut listener) in self.listeners.iter_mut() {
            listener(event, ctx);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}
