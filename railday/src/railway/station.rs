//! Stations: track assignment, departure gating and spawning.

use super::rail::Position;
use super::schedule::{SpawnStep, TrainScheduleStep};
use super::time::Time;
use super::train::Train;
use super::*;
use crate::sim::observable::SimulationEvent;
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashSet};

#[derive(Clone, Debug)]
pub struct Station {
    pub name: String,
    pub position: Position,
    pub importance: f64,
    pub tracks: Vec<TrackId>,
    /// Per template, its schedule steps at this station in authored order.
    pub schedules: BTreeMap<TemplateId, Vec<StepId>>,
    /// Templates whose journey starts here.
    pub spawns: BTreeMap<TemplateId, SpawnStep>,
    spawned: HashSet<TemplateId>,
    blocked: bool,
}

/// Which planned time of a schedule step to measure lateness against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    Arrival,
    Departure,
}

impl Station {
    pub fn new(name: &str, position: Position, importance: f64) -> Station {
        Station {
            name: name.to_string(),
            position,
            importance,
            tracks: Vec::new(),
            schedules: BTreeMap::new(),
            spawns: BTreeMap::new(),
            spawned: HashSet::new(),
            blocked: false,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn block_all_tracks(&mut self) {
        self.blocked = true;
    }

    pub fn unblock_all_tracks(&mut self) {
        self.blocked = false;
    }

    pub fn has_spawned(&self, template: TemplateId) -> bool {
        self.spawned.contains(&template)
    }

    pub fn reset(&mut self) {
        self.spawned.clear();
        self.blocked = false;
    }
}

impl SimulationContext {
    /// Departures first, then spawns.
    pub fn station_step(&mut self, station: StationId) -> Result<(), SimulationError> {
        self.departure_trains(station)?;
        self.spawn_trains(station)
    }

    /// Picks a free track for the template at the station, preferring `preferred`.
    /// `Ok(None)` means the train has to wait.
    pub fn assign_track(&self, station: StationId, preferred: TrackId, template: TemplateId)
                        -> Result<Option<TrackId>, SimulationError> {
        let net = &self.network;
        if net.tracks[preferred].station != station {
            return Err(SimulationError::ForeignTrack { track: preferred, station: self.station_name(station) });
        }
        let st = &net.stations[station];
        if st.blocked {
            return Ok(None);
        }
        if net.category_of(template).skips_rules {
            return Ok(if net.tracks[preferred].is_free() { Some(preferred) } else { None });
        }
        if net.tracks[preferred].is_free() {
            return Ok(Some(preferred));
        }

        let passing = net.current_step(station, template)
            .map(|s| net.steps[s].is_pass_through())
            .unwrap_or(false);
        let has_normal_track = st.tracks.iter().any(|&t| !net.tracks[t].is_placeholder());
        let any_track = passing || !has_normal_track;

        Ok(st.tracks.iter().cloned().find(|&t| {
            t != preferred && net.tracks[t].is_free() && (any_track || !net.tracks[t].is_placeholder())
        }))
    }

    /// Lets every parked train depart whose current stop allows it.
    pub fn departure_trains(&mut self, station: StationId) -> Result<(), SimulationError> {
        let tracks = self.network.stations[station].tracks.clone();
        for track in tracks {
            let train_id = match self.network.tracks[track].train() {
                Some(t) => t,
                None => continue,
            };
            self.with_train(train_id, |ctx, train| ctx.evaluate_departure(station, track, train))?;
        }
        Ok(())
    }

    fn evaluate_departure(&mut self, station: StationId, track: TrackId, train: &mut Train)
                          -> Result<(), SimulationError> {
        let step_id = match self.network.current_step(station, train.template) {
            Some(s) => s,
            None => return Err(SimulationError::MissingSchedule {
                train: self.network.display_name(train.template),
                station: self.station_name(station),
            }),
        };
        let step = self.network.steps[step_id].clone();

        let departure = match step.departure {
            Some(d) => d,
            None => {
                // Terminus or pass-through: leave right away.
                return self.depart_train(station, track, step_id, train);
            }
        };

        let now = self.clock;
        let late: SmallVec<[TrainId; 4]> = self.late_trains(station).into_iter()
            .filter(|&t| t != train.id)
            .collect();
        let mut wait_for_others = false;
        for other in late {
            if let Some(other) = self.train(other) {
                if train.should_wait_longer(other, self) {
                    wait_for_others = true;
                    break;
                }
            }
        }

        let next_day = train.delay.next_day(step.arrival, step.departure);
        let max_waiting = self.network.category_of(train.template).max_waiting_time;
        let exceeding = self.current_exceeding_time(station, train, Bound::Departure);
        let required_dwell = if step.arrival.is_some() {
            let share = (self.config.dwell_fraction * step.planned_dwell() as f64).ceil() as i64;
            share.max(self.config.min_dwell + step.min_dwell)
        } else {
            step.min_dwell
        };

        if now >= departure
            && !next_day.departure
            && (!wait_for_others || exceeding > max_waiting)
            && train.delay.dwell(now) >= required_dwell
        {
            self.depart_train(station, track, step_id, train)
        } else {
            if wait_for_others && now >= departure {
                debug!("{} waits at {} for late trains", self.network.display_name(train.template),
                       self.network.stations[station].name);
                train.delay.add_waiting_delay(self.config.time_step);
            }
            Ok(())
        }
    }

    /// Frees the track and sends the train onto the rail to its next station, or
    /// destroys it at the end of its journey. Marks the step satisfied.
    pub fn depart_train(&mut self, station: StationId, track: TrackId, step_id: StepId, train: &mut Train)
                        -> Result<(), SimulationError> {
        let step = self.network.steps[step_id].clone();
        match (step.next_station, step.next_rail) {
            (Some(next), Some(rail)) => {
                self.network.tracks[track].depart();
                let direction = self.network.rails[rail].direction_from(station);
                let exceeding = self.current_exceeding_time(station, train, Bound::Departure);
                train.depart(rail, direction, next);
                train.delay.set_displayed(exceeding);
                if let Some(d) = step.departure {
                    train.delay.set_previous_departure(d);
                }
                self.network.steps[step_id].real_departure = Some(self.clock);
                debug!("{} departs {} at {}", self.network.display_name(train.template),
                       self.network.stations[station].name, self.clock);
                self.emit(SimulationEvent::TrainDeparted { train: train.id, station, track });
                Ok(())
            }
            _ => {
                self.network.steps[step_id].real_departure = Some(self.clock);
                self.destroy_train(station, train)
            }
        }
    }

    /// Removes a train that has reached the end of its journey at this station.
    pub fn destroy_train(&mut self, station: StationId, train: &mut Train) -> Result<(), SimulationError> {
        let track = match train.track() {
            Some(t) if self.network.tracks[t].station == station => t,
            _ => return Err(SimulationError::NotAtStation {
                train: self.network.display_name(train.template),
                station: self.station_name(station),
            }),
        };
        self.network.tracks[track].depart();
        train.destroy();
        if self.network.templates[train.template].live == Some(train.id) {
            self.network.templates[train.template].live = None;
        }
        debug!("{} ends at {} at {}", self.network.display_name(train.template),
               self.network.stations[station].name, self.clock);
        self.remove_train(train.id);
        Ok(())
    }

    /// Spawns every template whose origin departure time has been reached.
    pub fn spawn_trains(&mut self, station: StationId) -> Result<(), SimulationError> {
        let spawns: Vec<(TemplateId, SpawnStep)> = self.network.stations[station].spawns.iter()
            .map(|(&t, &s)| (t, s))
            .collect();
        for (template, spawn) in spawns {
            if self.clock < spawn.departure || self.network.stations[station].has_spawned(template) {
                continue;
            }
            let track = match self.assign_track(station, spawn.track, template)? {
                Some(t) => t,
                None => continue,
            };
            if spawn.departure < self.config.start_time {
                warn!("{} spawns at {} with departure {} before simulation start {}",
                      self.network.display_name(template), self.network.stations[station].name,
                      spawn.departure, self.config.start_time);
            }
            self.add_train(template, track)?;
            debug!("{} spawned at {} on track {}", self.network.display_name(template),
                   self.network.stations[station].name, self.network.tracks[track].number);
            self.network.stations[station].spawned.insert(template);
        }
        Ok(())
    }

    /// Live trains whose departure from this station is overdue.
    pub fn late_trains(&self, station: StationId) -> Vec<TrainId> {
        let net = &self.network;
        net.stations[station].schedules.keys()
            .filter(|&&template| {
                let step = match net.current_step(station, template) {
                    Some(s) => &net.steps[s],
                    None => return false,
                };
                match step.departure {
                    Some(d) => d < self.clock && !net.templates[template].next_day_stations.contains(&station),
                    None => false,
                }
            })
            .filter_map(|&template| net.templates[template].live)
            .filter(|&t| self.live_trains().contains(&t))
            .collect()
    }

    /// Seconds the train is behind its current step at this station, clamped at
    /// zero and zero for next-day times.
    pub fn current_exceeding_time(&self, station: StationId, train: &mut Train, bound: Bound) -> i64 {
        let step = match self.network.current_step(station, train.template) {
            Some(s) => &self.network.steps[s],
            None => return 0,
        };
        let next_day = train.delay.next_day(step.arrival, step.departure);
        let (planned, rolled_over) = match bound {
            Bound::Arrival => (step.arrival, next_day.arrival),
            Bound::Departure => (step.departure, next_day.departure),
        };
        match planned {
            Some(t) if !rolled_over => (self.clock - t).max(0),
            _ => 0,
        }
    }

    /// The earliest pending arrival on the track at or after `time`.
    pub fn next_arrival_for_track(&self, track: TrackId, time: Time) -> Option<StepId> {
        self.next_for_track(track, |s| s.arrival.filter(|&a| a >= time))
    }

    /// The earliest pending departure from the track at or after `time`.
    pub fn next_departure_for_track(&self, track: TrackId, time: Time) -> Option<StepId> {
        self.next_for_track(track, |s| s.departure.filter(|&d| d >= time))
    }

    fn next_for_track<F>(&self, track: TrackId, planned: F) -> Option<StepId>
        where F: Fn(&TrainScheduleStep) -> Option<Time>
    {
        let net = &self.network;
        let station = net.tracks[track].station;
        net.stations[station].schedules.keys()
            .filter_map(|&template| net.current_step(station, template))
            .filter(|&s| net.steps[s].track == track)
            .filter_map(|s| planned(&net.steps[s]).map(|t| (t, s)))
            .min()
            .map(|(_, s)| s)
    }
}
