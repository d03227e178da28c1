//! Per-train delay ledger.

use super::time::Time;
use serde::Serialize;

/// Outcome of the day-rollover check for one schedule step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NextDay {
    pub arrival: bool,
    pub departure: bool,
}

/// Lateness of one train, split into external (user injected), waiting (yielding to
/// other trains) and conflict (blocked by occupied tracks) seconds.
///
/// `displayed` is what observers show. Station logic overwrites it at arrivals and
/// departures with the current exceedance, so it does not compound across legs.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Delay {
    actual_arrival: Time,
    external: i64,
    external_handled: i64,
    waiting: i64,
    conflict: i64,
    displayed: i64,
    previous_departure: Option<Time>,
    day_shift: bool,
}

impl Delay {
    pub fn new(now: Time) -> Delay {
        Delay { actual_arrival: now, ..Default::default() }
    }

    pub fn actual_arrival(&self) -> Time {
        self.actual_arrival
    }

    pub fn set_actual_arrival(&mut self, t: Time) {
        self.actual_arrival = t;
    }

    /// Seconds spent at the current stop.
    pub fn dwell(&self, now: Time) -> i64 {
        now - self.actual_arrival
    }

    /// User injected delay.
    pub fn add_delay(&mut self, seconds: i64) {
        self.external += seconds;
        self.displayed += seconds;
    }

    pub fn add_waiting_delay(&mut self, seconds: i64) {
        self.waiting += seconds;
        self.displayed += seconds;
    }

    pub fn add_conflict_delay(&mut self, seconds: i64) {
        self.conflict += seconds;
        self.displayed += seconds;
    }

    /// Marks up to `seconds` of the external delay as worked off.
    pub fn user_delay_handle(&mut self, seconds: i64) {
        let remaining = (self.external - self.external_handled).max(0);
        self.external_handled += seconds.min(remaining).max(0);
    }

    pub fn user_delay_handled(&self) -> bool {
        self.external_handled >= self.external
    }

    pub fn unhandled_user_delay(&self) -> i64 {
        (self.external - self.external_handled).max(0)
    }

    pub fn external(&self) -> i64 { self.external.max(0) }
    pub fn waiting(&self) -> i64 { self.waiting.max(0) }
    pub fn conflict(&self) -> i64 { self.conflict.max(0) }

    /// Authoritative lateness.
    pub fn total(&self) -> i64 {
        (self.external + self.waiting + self.conflict).max(0)
    }

    pub fn displayed(&self) -> i64 {
        self.displayed.max(0)
    }

    pub fn set_displayed(&mut self, seconds: i64) {
        self.displayed = seconds;
    }

    pub fn previous_departure(&self) -> Option<Time> {
        self.previous_departure
    }

    pub fn set_previous_departure(&mut self, t: Time) {
        self.previous_departure = Some(t);
    }

    pub fn day_shifted(&self) -> bool {
        self.day_shift
    }

    /// Detects schedule times that lie before the previous departure, i.e. on the
    /// following day. Only a single day is modelled: once a rollover was seen it is
    /// reported for every later check.
    pub fn next_day(&mut self, arrival: Option<Time>, departure: Option<Time>) -> NextDay {
        if self.day_shift {
            return NextDay { arrival: true, departure: true };
        }
        if let Some(prev) = self.previous_departure {
            if arrival.map(|a| a < prev).unwrap_or(false) {
                self.day_shift = true;
                return NextDay { arrival: true, departure: true };
            }
            if departure.map(|d| d < prev).unwrap_or(false) {
                self.day_shift = true;
                return NextDay { arrival: false, departure: true };
            }
        }
        NextDay::default()
    }
}
