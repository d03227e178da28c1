use super::history::History;
use crate::railway::delay::Delay;
use crate::railway::TemplateId;
use crate::sim::{Simulation, TimetableRow};
use failure::Error;
use serde::Serialize;
use std::io;

#[derive(Serialize)]
struct TrainTimetable<'a> {
    number: u32,
    name: String,
    stops: Vec<TimetableRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay: Option<&'a Delay>,
}

pub fn json_history<W: io::Write>(history: &History, f: &mut W) -> Result<(), Error> {
    serde_json::to_writer_pretty(f, history)?;
    Ok(())
}

pub fn javascript_history<W: io::Write>(history: &History, f: &mut W) -> Result<(), Error> {
    write!(f, "var data = ")?;
    serde_json::to_writer(&mut *f, history)?;
    write!(f, ";")?;
    Ok(())
}

/// Planned and realized times of every train template, with the delay account
/// of its live or last train.
pub fn json_timetables<W: io::Write>(sim: &Simulation, f: &mut W) -> Result<(), Error> {
    let net = &sim.ctx.network;
    let last_trains = |template: TemplateId| sim.ctx.all_trains().filter(move |t| t.template == template).last();
    let timetables: Vec<TrainTimetable> = net.templates.iter().enumerate().map(|(i, t)| {
        TrainTimetable {
            number: t.number,
            name: net.display_name(i),
            stops: sim.template_timetable(i),
            delay: last_trains(i).map(|t| &t.delay),
        }
    }).collect();
    serde_json::to_writer_pretty(f, &timetables)?;
    Ok(())
}
