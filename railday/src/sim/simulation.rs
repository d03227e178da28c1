use super::observable::{Listener, ListenerId, Observers, SimulationEvent};
use crate::config::Config;
use crate::railway::category::TrainCategory;
use crate::railway::network::Network;
use crate::railway::station::{Bound, Station};
use crate::railway::time::Time;
use crate::railway::train::Train;
use crate::railway::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Shared auto-run flag. Clearing it stops `run_automatically` before its next step,
/// also from another thread.
#[derive(Clone, Debug, Default)]
pub struct AutoRunHandle(Arc<AtomicBool>);

impl AutoRunHandle {
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
    pub fn set(&self, run: bool) {
        self.0.store(run, Ordering::SeqCst)
    }
    pub fn stop(&self) {
        self.set(false)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Stepped,
    /// The clock cannot advance within the day; nothing changed.
    DayEnded,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationState {
    pub time_step: i64,
    pub current_time: Time,
    pub auto_run: bool,
    pub auto_run_speed: u64,
    /// Wall-clock duration of the last step.
    pub last_step_duration: Duration,
}

/// Planned and realized times of one stop.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimetableRow {
    pub station: String,
    pub platform: u32,
    pub track: String,
    pub planned_arrival: Option<Time>,
    pub planned_departure: Option<Time>,
    pub real_arrival: Option<Time>,
    pub real_departure: Option<Time>,
}

/// The simulation driver: advances the clock, then runs every station and then
/// every live train, and notifies listeners.
pub struct Simulation {
    pub ctx: SimulationContext,
    auto_run: AutoRunHandle,
    last_step: Duration,
    observers: Observers,
}

impl Simulation {
    pub fn new(network: Network, config: Config) -> Simulation {
        Simulation {
            ctx: SimulationContext::new(network, config),
            auto_run: AutoRunHandle::default(),
            last_step: Duration::from_secs(0),
            observers: Observers::new(),
        }
    }

    pub fn current_time(&self) -> Time {
        self.ctx.clock
    }

    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    pub fn set_time_step(&mut self, seconds: i64) {
        if seconds <= 0 {
            warn!("Ignoring non-positive time step {}", seconds);
            return;
        }
        self.ctx.config.time_step = seconds;
    }

    pub fn set_auto_run_speed(&mut self, millis: u64) {
        self.ctx.config.auto_run_speed = millis;
    }

    pub fn auto_run(&self) -> bool {
        self.auto_run.get()
    }

    pub fn set_auto_run(&mut self, run: bool) {
        self.auto_run.set(run);
    }

    pub fn auto_run_handle(&self) -> AutoRunHandle {
        self.auto_run.clone()
    }

    pub fn state(&self) -> SimulationState {
        SimulationState {
            time_step: self.ctx.config.time_step,
            current_time: self.ctx.clock,
            auto_run: self.auto_run.get(),
            auto_run_speed: self.ctx.config.auto_run_speed,
            last_step_duration: self.last_step,
        }
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.observers.unsubscribe(id)
    }

    /// True if one more step advances the clock and stays within the simulated day.
    pub fn can_step(&self) -> bool {
        let dt = self.ctx.config.time_step;
        dt > 0 && self.ctx.clock.to_seconds() + dt < self.ctx.config.day_length
    }

    pub fn step(&mut self) -> Result<StepOutcome, SimulationError> {
        if !self.can_step() {
            self.auto_run.stop();
            return Ok(StepOutcome::DayEnded);
        }
        let started = Instant::now();
        let dt = self.ctx.config.time_step;
        self.ctx.clock.add_seconds(dt);

        let result = self.step_world();
        self.dispatch();
        result?;

        self.last_step = started.elapsed();
        let now = self.ctx.clock;
        self.observers.notify(&SimulationEvent::StepCompleted(now), &self.ctx);
        Ok(StepOutcome::Stepped)
    }

    fn step_world(&mut self) -> Result<(), SimulationError> {
        for station in 0..self.ctx.network.stations.len() {
            self.ctx.station_step(station)?;
        }
        let trains = self.ctx.live_trains().to_vec();
        for train in trains {
            self.ctx.with_train(train, |ctx, t| t.step(ctx))?;
        }
        Ok(())
    }

    fn dispatch(&mut self) {
        for event in self.ctx.take_events() {
            self.observers.notify(&event, &self.ctx);
        }
    }

    pub fn reset(&mut self) {
        self.ctx.reset();
        self.ctx.take_events();
        self.observers.notify(&SimulationEvent::Reset, &self.ctx);
    }

    /// Steps at `auto_run_speed` pace for as long as the auto-run flag is set. The
    /// flag is checked before every step; reaching the end of the day clears it.
    pub fn run_automatically(&mut self) -> Result<(), SimulationError> {
        let end = Time::from_seconds(self.ctx.config.day_length);
        self.run_automatically_until(end)
    }

    /// Like `run_automatically`, but also clears the flag once the clock reaches
    /// `until`. A failing step clears it too.
    pub fn run_automatically_until(&mut self, until: Time) -> Result<(), SimulationError> {
        while self.auto_run.get() {
            if self.ctx.clock >= until {
                self.auto_run.stop();
                break;
            }
            match self.step() {
                Ok(StepOutcome::Stepped) => {}
                Ok(StepOutcome::DayEnded) => break,
                Err(e) => {
                    self.auto_run.stop();
                    return Err(e);
                }
            }
            let pause = self.ctx.config.auto_run_speed;
            if pause > 0 {
                thread::sleep(Duration::from_millis(pause));
            }
        }
        Ok(())
    }

    /// Steps without pacing until the clock reaches `until` or the day ends.
    /// Returns the number of steps taken.
    pub fn run_until(&mut self, until: Time) -> Result<usize, SimulationError> {
        let mut steps = 0;
        while self.ctx.clock < until {
            match self.step()? {
                StepOutcome::Stepped => steps += 1,
                StepOutcome::DayEnded => break,
            }
        }
        Ok(steps)
    }

    /// Live trains in spawn order.
    pub fn trains(&self) -> impl Iterator<Item = &Train> {
        let ctx = &self.ctx;
        ctx.live_trains().iter().filter_map(move |&id| ctx.train(id))
    }

    pub fn train(&self, id: TrainId) -> Option<&Train> {
        self.ctx.train(id)
    }

    pub fn stations(&self) -> &[Station] {
        &self.ctx.network.stations
    }

    pub fn station_by_name(&self, name: &str) -> Option<StationId> {
        self.ctx.network.station_by_name(name)
    }

    /// The live train of the template with the given number.
    pub fn train_by_number(&self, number: u32) -> Option<TrainId> {
        self.ctx.network.templates.iter()
            .find(|t| t.number == number)
            .and_then(|t| t.live)
    }

    /// Injects an external delay, worked off before the train moves again.
    pub fn add_delay(&mut self, train: TrainId, seconds: i64) -> Result<(), SimulationError> {
        let t = self.ctx.train_mut(train).ok_or(SimulationError::UnknownTrain(train))?;
        t.add_delay(seconds);
        info!("Added {} s delay to train {}", seconds, train);
        Ok(())
    }

    pub fn block_station(&mut self, station: StationId) {
        self.ctx.network.stations[station].block_all_tracks();
    }

    pub fn unblock_station(&mut self, station: StationId) {
        self.ctx.network.stations[station].unblock_all_tracks();
    }

    pub fn category_mut(&mut self, code: &str) -> Option<&mut TrainCategory> {
        self.ctx.network.categories.iter_mut().find(|c| c.code.eq_ignore_ascii_case(code))
    }

    /// Seconds the train is behind schedule at the station it is at or heading to.
    pub fn current_exceedance(&mut self, train: TrainId) -> Result<i64, SimulationError> {
        self.ctx.with_train(train, |ctx, t| {
            let (station, bound) = match t.track() {
                Some(track) => (ctx.network.tracks[track].station, Bound::Departure),
                None => match t.next_station {
                    Some(s) => (s, Bound::Arrival),
                    None => return Ok(0),
                },
            };
            Ok(ctx.current_exceeding_time(station, t, bound))
        })
    }

    pub fn next_arrival_for_track(&self, track: TrackId) -> Option<StepId> {
        self.ctx.next_arrival_for_track(track, self.ctx.clock)
    }

    pub fn next_departure_for_track(&self, track: TrackId) -> Option<StepId> {
        self.ctx.next_departure_for_track(track, self.ctx.clock)
    }

    /// Realized against planned times for every stop of the template, in order.
    pub fn template_timetable(&self, template: TemplateId) -> Vec<TimetableRow> {
        let net = &self.ctx.network;
        net.templates[template].stops.iter().map(|&s| {
            let step = &net.steps[s];
            let track = &net.tracks[step.track];
            TimetableRow {
                station: net.stations[step.station].name.clone(),
                platform: track.platform,
                track: track.number.clone(),
                planned_arrival: step.arrival,
                planned_departure: step.departure,
                real_arrival: step.real_arrival,
                real_departure: step.real_departure,
            }
        }).collect()
    }
}
