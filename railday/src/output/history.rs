use crate::railway::time::Time;
use crate::railway::SimulationContext;
use crate::sim::observable::{Listener, SimulationEvent};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Network-wide figures after one step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepRecord {
    pub time: Time,
    pub live_trains: usize,
    /// Mean displayed delay of live trains in seconds, 0 with no trains.
    pub mean_delay: f64,
    pub max_delay: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoggedEvent {
    pub time: Time,
    /// Display name of the train the event is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train: Option<String>,
    pub event: SimulationEvent,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct History {
    pub steps: Vec<StepRecord>,
    pub events: Vec<LoggedEvent>,
}

impl History {
    pub fn new() -> History {
        Default::default()
    }

    /// Appends one notification. Step completions become a `StepRecord`,
    /// everything else goes to the event log. A reset clears the history.
    pub fn record(&mut self, event: &SimulationEvent, ctx: &SimulationContext) {
        use self::SimulationEvent::*;
        let train = match *event {
            TrainAdded(t) | TrainRemoved(t) => Some(t),
            TrainArrived { train, .. } | TrainDeparted { train, .. } => Some(train),
            StepCompleted(time) => {
                self.steps.push(step_record(time, ctx));
                return;
            }
            Reset => {
                self.steps.clear();
                self.events.clear();
                return;
            }
        };
        let train = train
            .and_then(|t| ctx.train(t))
            .map(|t| t.display_name(ctx));
        self.events.push(LoggedEvent { time: ctx.now(), train, event: event.clone() });
    }

    /// Arrival and departure lines, one per event: `time event train station`.
    pub fn movements(&self, ctx: &SimulationContext) -> String {
        use std::fmt::Write;
        let mut s = String::new();
        for e in &self.events {
            let (what, station) = match e.event {
                SimulationEvent::TrainArrived { station, .. } => ("arr", station),
                SimulationEvent::TrainDeparted { station, .. } => ("dep", station),
                _ => continue,
            };
            let _ = writeln!(s, "{} {} {} {}", e.time, what,
                             e.train.as_ref().map(|n| n.as_str()).unwrap_or("?"),
                             ctx.network.stations[station].name);
        }
        s
    }
}

fn step_record(time: Time, ctx: &SimulationContext) -> StepRecord {
    let delays: Vec<i64> = ctx.live_trains().iter()
        .filter_map(|&t| ctx.train(t))
        .map(|t| t.delay.displayed())
        .collect();
    let mean_delay = if delays.is_empty() {
        0.0
    } else {
        delays.iter().sum::<i64>() as f64 / delays.len() as f64
    };
    StepRecord {
        time,
        live_trains: delays.len(),
        mean_delay,
        max_delay: delays.iter().cloned().max().unwrap_or(0),
    }
}

/// A listener that appends to a shared history.
pub fn recorder(history: Rc<RefCell<History>>) -> Listener {
    Box::new(move |event, ctx| history.borrow_mut().record(event, ctx))
}
