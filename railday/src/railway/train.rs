use super::delay::Delay;
use super::dynamics::*;
use super::rail::{Direction, Position};
use super::time::Time;
use super::*;

/// Where a train is: parked on a platform track or travelling along a rail.
/// `distance` is measured from the station the train departed from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TrainPosition {
    AtTrack(TrackId),
    OnRail { rail: RailId, direction: Direction, distance: f64 },
}

/// A live instance of a train template.
#[derive(Clone, Debug)]
pub struct Train {
    pub id: TrainId,
    pub template: TemplateId,
    /// m/s
    pub velocity: f64,
    pub acceleration: AccelerationStatus,
    pub position: TrainPosition,
    /// Set while travelling on a rail.
    pub next_station: Option<StationId>,
    pub delay: Delay,
    /// Held in front of a station: too early or no free track.
    pub waiting: bool,
    pub destroyed: bool,
}

impl Train {
    pub fn new(id: TrainId, template: TemplateId, track: TrackId, now: Time) -> Train {
        Train {
            id,
            template,
            velocity: 0.0,
            acceleration: AccelerationStatus::Accelerating,
            position: TrainPosition::AtTrack(track),
            next_station: None,
            delay: Delay::new(now),
            waiting: false,
            destroyed: false,
        }
    }

    pub fn track(&self) -> Option<TrackId> {
        match self.position {
            TrainPosition::AtTrack(t) => Some(t),
            TrainPosition::OnRail { .. } => None,
        }
    }

    pub fn display_name(&self, ctx: &SimulationContext) -> String {
        ctx.network.display_name(self.template)
    }

    pub fn geo_position(&self, ctx: &SimulationContext) -> Position {
        match self.position {
            TrainPosition::AtTrack(t) => ctx.network.stations[ctx.network.tracks[t].station].position,
            TrainPosition::OnRail { rail, direction, distance } => {
                let rail = &ctx.network.rails[rail];
                rail.position_at(rail.oriented(direction, distance))
            }
        }
    }

    /// Distance left to the next station, if travelling.
    pub fn distance_to_next_station(&self, ctx: &SimulationContext) -> Option<f64> {
        match self.position {
            TrainPosition::OnRail { rail, distance, .. } =>
                Some((ctx.network.rails[rail].length() - distance).max(0.0)),
            TrainPosition::AtTrack(_) => None,
        }
    }

    /// External (user) delay in seconds. Movement stops until it is worked off.
    pub fn add_delay(&mut self, seconds: i64) {
        self.delay.add_delay(seconds);
    }

    pub fn stop(&mut self) {
        self.velocity = 0.0;
        self.acceleration = AccelerationStatus::Constant;
    }

    pub(crate) fn arrive(&mut self, track: TrackId, now: Time) {
        self.position = TrainPosition::AtTrack(track);
        self.next_station = None;
        self.waiting = false;
        self.delay.set_actual_arrival(now);
    }

    pub(crate) fn depart(&mut self, rail: RailId, direction: Direction, next: StationId) {
        self.position = TrainPosition::OnRail { rail, direction, distance: 0.0 };
        self.next_station = Some(next);
        self.acceleration = AccelerationStatus::Accelerating;
    }

    pub(crate) fn destroy(&mut self) {
        self.destroyed = true;
        self.waiting = false;
        self.stop();
    }

    fn params(&self, ctx: &SimulationContext) -> TrainParams {
        let category = ctx.network.category_of(self.template);
        TrainParams { max_acc: category.acceleration, max_vel: category.max_velocity }
    }

    /// Moves the train, then handles reaching the next station.
    pub fn step(&mut self, ctx: &mut SimulationContext) -> Result<(), SimulationError> {
        if self.destroyed {
            return Ok(());
        }
        if !self.waiting {
            self.move_train(ctx);
        }
        self.handle_next_station_arrival(ctx)
    }

    fn move_train(&mut self, ctx: &SimulationContext) {
        let (rail_id, direction, distance) = match self.position {
            TrainPosition::OnRail { rail, direction, distance } => (rail, direction, distance),
            TrainPosition::AtTrack(_) => return,
        };
        let dt = ctx.time_step();
        if !self.delay.user_delay_handled() {
            self.stop();
            self.delay.user_delay_handle(dt);
            return;
        }

        let dt = dt as f64;
        let rail = &ctx.network.rails[rail_id];
        let params = self.params(ctx);
        let remaining = rail.length() - distance;
        let speed_limit = rail.max_speed(rail.oriented(direction, distance));

        // Only brake for stations the train actually stops at.
        let stops_next = self.next_station
            .and_then(|s| ctx.network.current_step(s, self.template))
            .map(|s| !ctx.network.steps[s].is_pass_through())
            .unwrap_or(true);
        let braking_target = if stops_next {
            let braking = self.acceleration == AccelerationStatus::Decelerating;
            calculate_arriving_velocity(&params, self.velocity, remaining, dt, braking)
        } else {
            None
        };

        let (update, status) = velocity_step(&params, self.velocity, &[speed_limit], braking_target, dt);
        self.velocity = update.v;
        self.acceleration = status;
        // Never run past the station.
        let new_distance = (distance + update.dx).min(rail.length());
        self.position = TrainPosition::OnRail { rail: rail_id, direction, distance: new_distance };
    }

    fn handle_next_station_arrival(&mut self, ctx: &mut SimulationContext) -> Result<(), SimulationError> {
        let next = match self.next_station {
            Some(s) => s,
            None => return Ok(()),
        };
        let arrived = match self.position {
            TrainPosition::OnRail { rail, distance, .. } => distance >= ctx.network.rails[rail].length(),
            TrainPosition::AtTrack(_) => return Ok(()),
        };
        if !arrived {
            return Ok(());
        }

        let step_id = match ctx.network.current_step(next, self.template) {
            Some(s) => s,
            None => return Err(SimulationError::MissingSchedule {
                train: ctx.network.display_name(self.template),
                station: ctx.station_name(next),
            }),
        };
        let step = ctx.network.steps[step_id].clone();
        let next_day = self.delay.next_day(step.arrival, step.departure);

        if let Some(arrival) = step.arrival {
            if ctx.clock < arrival && !next_day.arrival {
                // Early: hold in front of the station.
                self.stop();
                self.waiting = true;
                return Ok(());
            }
        }

        match ctx.assign_track(next, step.track, self.template)? {
            None => {
                if !self.waiting {
                    debug!("{} waits for a free track at {}", ctx.network.display_name(self.template),
                           ctx.station_name(next));
                }
                self.stop();
                self.waiting = true;
                self.delay.add_conflict_delay(ctx.time_step());
            }
            Some(track) => {
                if step.arrival.is_some() {
                    self.stop();
                }
                if !ctx.track_arrival(track, self, step.arrival) {
                    return Err(SimulationError::TrackOccupied { track, station: ctx.station_name(next) });
                }
                ctx.network.steps[step_id].real_arrival = Some(ctx.clock);
            }
        }
        Ok(())
    }

    /// Whether this train, parked at a station, should keep waiting for `other`.
    ///
    /// A train waits for late trains of the same or higher priority while it still
    /// has waiting time left, unless both are due to depart here and the other one
    /// was due earlier or is already later than the gap between their departures.
    pub fn should_wait_longer(&mut self, other: &Train, ctx: &SimulationContext) -> bool {
        let station = match self.track() {
            Some(t) => ctx.network.tracks[t].station,
            None => return false,
        };
        let net = &ctx.network;
        let other_step = match net.current_step(station, other.template) {
            Some(s) => &net.steps[s],
            None => return false,
        };
        match other_step.planned_time() {
            Some(t) if t < ctx.clock => {}
            _ => return false,
        }

        let own = net.category_of(self.template);
        let theirs = net.category_of(other.template);
        let exceeding = ctx.current_exceeding_time(station, self, station::Bound::Departure);
        let time_left = own.max_waiting_time - exceeding;
        if time_left <= 0 || theirs.priority < own.priority {
            return false;
        }

        let own_departure = net.current_step(station, self.template).and_then(|s| net.steps[s].departure);
        if let (Some(own_dep), Some(other_dep)) = (own_departure, other_step.departure) {
            let interval = other_dep - own_dep;
            let other_late = ctx.clock - other_dep;
            if interval < 0 || (interval <= time_left && other_late > interval) {
                return false;
            }
        }
        true
    }
}
