//! Builds the ID-indexed network from an importer description.

use super::network::*;
use crate::config::Config;
use crate::railway::category::CategoryTable;
use crate::railway::network::Network;
use crate::railway::rail::{Position, Rail};
use crate::railway::schedule::{SpawnStep, TrainScheduleStep, TrainTemplate};
use crate::railway::time::Time;
use crate::railway::track::PLACEHOLDER_PLATFORM;
use crate::railway::{RailId, StationId};
use std::collections::HashSet;

#[derive(Debug, Fail, PartialEq)]
pub enum ImportError {
    #[fail(display = "duplicate station: {}", _0)]
    DuplicateStation(String),
    #[fail(display = "unknown station {:?} referenced by {}", station, by)]
    UnknownStation { station: String, by: String },
    #[fail(display = "train {} has less than two stops", _0)]
    TooFewStops(u32),
    #[fail(display = "train {} has no departure time at its first stop", _0)]
    MissingDeparture(u32),
    #[fail(display = "train {} has an invalid time {:?}", train, value)]
    InvalidTime { train: u32, value: String },
    #[fail(display = "rail {} - {} has {} speed limits for {} segments", from, to, speeds, segments)]
    SpeedCount { from: String, to: String, speeds: usize, segments: usize },
}

fn parse_time(train: u32, value: &Option<String>) -> Result<Option<Time>, ImportError> {
    match *value {
        Some(ref s) => s.parse::<Time>()
            .map(Some)
            .map_err(|_e| ImportError::InvalidTime { train, value: s.clone() }),
        None => Ok(None),
    }
}

fn station(net: &Network, name: &str, by: &str) -> Result<StationId, ImportError> {
    net.station_by_name(name)
        .ok_or_else(|| ImportError::UnknownStation { station: name.to_string(), by: by.to_string() })
}

/// Builds the network. Categories in the description extend or replace the
/// default category table.
pub fn build_network(desc: &NetworkDescription, config: &Config) -> Result<Network, ImportError> {
    let mut net = Network::new();

    let mut categories = CategoryTable::default();
    for c in &desc.categories {
        categories.insert(c.clone());
    }

    for s in &desc.stations {
        if net.station_by_name(&s.name).is_some() {
            return Err(ImportError::DuplicateStation(s.name.clone()));
        }
        net.add_station(&s.name, Position::new(s.latitude, s.longitude), s.importance);
    }

    for r in &desc.rails {
        let by = format!("rail {} - {}", r.from, r.to);
        let from = station(&net, &r.from, &by)?;
        let to = station(&net, &r.to, &by)?;
        net.add_rail(build_rail(&net, from, to, r, config.default_rail_speed)?);
    }

    for t in &desc.trains {
        add_train(&mut net, &categories, t, config)?;
    }

    info!("Imported {:?}", net);
    Ok(net)
}

fn build_rail(net: &Network, from: StationId, to: StationId, r: &RailDescription, default_speed: f64)
              -> Result<Rail, ImportError> {
    let mut points = vec![net.stations[from].position];
    points.extend(r.points.iter().map(|p| Position::new(p[0], p[1])));
    points.push(net.stations[to].position);
    let segments = points.len() - 1;

    let speeds = if r.max_speeds.is_empty() {
        vec![default_speed; segments]
    } else if r.max_speeds.len() != segments {
        return Err(ImportError::SpeedCount {
            from: r.from.clone(), to: r.to.clone(), speeds: r.max_speeds.len(), segments,
        });
    } else {
        r.max_speeds.iter().enumerate().map(|(i, v)| match *v {
            Some(v) if !v.is_nan() => v,
            _ => {
                warn!("Rail {} - {} segment {} has no numeric speed limit, using {} m/s",
                      r.from, r.to, i, default_speed);
                default_speed
            }
        }).collect()
    };
    Ok(Rail::new(from, to, points, speeds))
}

fn rail_to(net: &mut Network, from: StationId, to: StationId, default_speed: f64) -> RailId {
    if let Some(r) = net.rail_between(from, to) {
        return r;
    }
    debug!("Synthesizing rail {} - {}", net.stations[from].name, net.stations[to].name);
    let points = vec![net.stations[from].position, net.stations[to].position];
    net.add_rail(Rail::new(from, to, points, vec![default_speed]))
}

fn add_train(net: &mut Network, categories: &CategoryTable, t: &TrainDescription, config: &Config)
             -> Result<(), ImportError> {
    if t.stops.len() < 2 {
        return Err(ImportError::TooFewStops(t.number));
    }
    let category = net.add_category(categories.lookup(&t.category));
    let template = net.add_template(TrainTemplate {
        number: t.number,
        category,
        name: t.name.clone(),
        description: t.description.clone(),
        stops: Vec::new(),
        next_day_stations: HashSet::new(),
        live: None,
    });
    let by = format!("train {}", t.number);
    let last = t.stops.len() - 1;

    let mut previous_departure: Option<Time> = None;
    let mut rolled_over = false;

    for (i, stop) in t.stops.iter().enumerate() {
        let st = station(net, &stop.station_name, &by)?;
        let track = match stop.track {
            Some(ref tr) => net.add_track(st, tr.platform, &tr.track),
            None => net.add_track(st, PLACEHOLDER_PLATFORM, "?"),
        };
        let mut arrival = parse_time(t.number, &stop.arrival_time)?;
        let mut departure = parse_time(t.number, &stop.departure_time)?;

        if i == 0 {
            let d = departure.ok_or(ImportError::MissingDeparture(t.number))?;
            arrival = None;
            net.add_spawn(st, template, SpawnStep { departure: d, track });
        }
        if i == last && departure.is_some() {
            warn!("Train {} has a departure time at its last stop {}, ignoring it",
                  t.number, stop.station_name);
            departure = None;
        }

        if let Some(prev) = previous_departure {
            if rolled_over || arrival.map(|a| a < prev).unwrap_or(false)
                || departure.map(|d| d < prev).unwrap_or(false) {
                rolled_over = true;
                net.templates[template].next_day_stations.insert(st);
            }
        }
        if departure.is_some() {
            previous_departure = departure;
        }

        let (next_station, next_rail) = if i < last {
            let next = station(net, &t.stops[i + 1].station_name, &by)?;
            (Some(next), Some(rail_to(net, st, next, config.default_rail_speed)))
        } else {
            (None, None)
        };

        net.add_schedule_step(TrainScheduleStep {
            template,
            station: st,
            track,
            arrival,
            departure,
            next_station,
            next_rail,
            min_dwell: stop.min_dwell,
            real_arrival: None,
            real_departure: None,
        });
    }
    Ok(())
}
