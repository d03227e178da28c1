use super::network::Network;
use super::station::Bound;
use super::time::Time;
use super::train::Train;
use super::*;
use crate::config::Config;
use crate::sim::observable::SimulationEvent;
use std::mem;

/// Everything a simulation step reads and writes: the network, the train arena, the
/// clock and the configuration. Stations and trains refer to each other only through
/// IDs into this context.
#[derive(Debug)]
pub struct SimulationContext {
    pub network: Network,
    pub config: Config,
    pub clock: Time,
    /// Every train spawned since the last reset, indexed by `TrainId`. A slot is
    /// empty only while its train is being stepped.
    trains: Vec<Option<Train>>,
    /// Live trains in spawn order.
    live: Vec<TrainId>,
    events: Vec<SimulationEvent>,
}

impl SimulationContext {
    pub fn new(network: Network, config: Config) -> SimulationContext {
        SimulationContext {
            clock: config.start_time,
            network,
            config,
            trains: Vec::new(),
            live: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn now(&self) -> Time {
        self.clock
    }

    pub fn time_step(&self) -> i64 {
        self.config.time_step
    }

    pub fn live_trains(&self) -> &[TrainId] {
        &self.live
    }

    pub fn train(&self, id: TrainId) -> Option<&Train> {
        self.trains.get(id).and_then(|t| t.as_ref())
    }

    pub fn train_mut(&mut self, id: TrainId) -> Option<&mut Train> {
        self.trains.get_mut(id).and_then(|t| t.as_mut())
    }

    /// All trains spawned since the last reset, destroyed ones included.
    pub fn all_trains(&self) -> impl Iterator<Item = &Train> {
        self.trains.iter().filter_map(|t| t.as_ref())
    }

    /// Runs `f` with the train moved out of the arena, so that it can be mutated
    /// alongside the rest of the context. The train is put back even on error.
    pub fn with_train<R, F>(&mut self, id: TrainId, f: F) -> Result<R, SimulationError>
        where F: FnOnce(&mut SimulationContext, &mut Train) -> Result<R, SimulationError>
    {
        let mut train = self.trains.get_mut(id).and_then(|t| t.take())
            .ok_or(SimulationError::UnknownTrain(id))?;
        let result = f(self, &mut train);
        self.trains[id] = Some(train);
        result
    }

    /// Places a new train on the given track. The track must be free.
    pub fn add_train(&mut self, template: TemplateId, track: TrackId) -> Result<TrainId, SimulationError> {
        if !self.network.tracks[track].is_free() {
            let station = self.network.tracks[track].station;
            return Err(SimulationError::TrackOccupied { track, station: self.station_name(station) });
        }
        let id = self.trains.len();
        let mut train = Train::new(id, template, track, self.clock);
        self.trains.push(None);
        self.live.push(id);
        self.network.templates[template].live = Some(id);
        self.emit(SimulationEvent::TrainAdded(id));
        self.track_arrival(track, &mut train, None);
        self.trains[id] = Some(train);
        Ok(id)
    }

    /// Drops the train from the live collection. No-op if it is not live.
    pub fn remove_train(&mut self, id: TrainId) {
        if let Some(i) = self.live.iter().position(|&t| t == id) {
            self.live.remove(i);
            self.emit(SimulationEvent::TrainRemoved(id));
        }
    }

    /// Binds the train to the track, stamps its real arrival and, for a planned
    /// stop, resets the displayed delay to the arrival exceedance.
    /// Returns false if the track is occupied.
    pub fn track_arrival(&mut self, track: TrackId, train: &mut Train, planned_arrival: Option<Time>) -> bool {
        if !self.network.tracks[track].occupy(train.id) {
            return false;
        }
        let station = self.network.tracks[track].station;
        train.arrive(track, self.clock);
        if planned_arrival.is_some() {
            let exceeding = self.current_exceeding_time(station, train, Bound::Arrival);
            train.delay.set_displayed(exceeding);
        }
        self.emit(SimulationEvent::TrainArrived { train: train.id, station, track });
        true
    }

    /// Clears all run state and rewinds the clock.
    pub fn reset(&mut self) {
        self.clock = self.config.start_time;
        self.trains.clear();
        self.live.clear();
        self.network.reset();
    }

    pub fn emit(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<SimulationEvent> {
        mem::replace(&mut self.events, Vec::new())
    }

    pub fn station_name(&self, station: StationId) -> String {
        self.network.stations[station].name.clone()
    }
}
