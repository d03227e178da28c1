use maplit::*;
use railday::config::Config;
use railday::output::history::{self, History};
use railday::railway::time::Time;
use railday::railway::{SimulationError, TrainId};
use railday::sim::observable::SimulationEvent;
use railday::sim::{Simulation, StepOutcome};
use railday::*;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

const LINE: &str = r#"{
    "stations": [
        { "name": "A", "latitude": 50.00, "longitude": 20.0 },
        { "name": "B", "latitude": 50.05, "longitude": 20.0 },
        { "name": "C", "latitude": 50.08, "longitude": 20.0 }
    ],
    "trains": [
        { "number": 101, "category": "IC", "stops": [
            { "station_name": "A", "track": { "platform": 1, "track": "1" }, "departure_time": "08:00:00" },
            { "station_name": "B", "track": { "platform": 1, "track": "1" },
              "arrival_time": "08:10:00", "departure_time": "08:12:00" },
            { "station_name": "C", "track": { "platform": 1, "track": "1" }, "arrival_time": "08:20:00" }
        ] },
        { "number": 202, "category": "R", "stops": [
            { "station_name": "A", "track": { "platform": 1, "track": "1" }, "departure_time": "08:00:00" },
            { "station_name": "B", "track": { "platform": 1, "track": "1" },
              "arrival_time": "08:14:00", "departure_time": "08:15:00" },
            { "station_name": "C", "track": { "platform": 1, "track": "1" }, "arrival_time": "08:25:00" }
        ] }
    ]
}"#;

// The rail is described from B to A, so trains from A run it backwards.
const REVERSED: &str = r#"{
    "stations": [
        { "name": "A", "latitude": 50.00, "longitude": 20.0 },
        { "name": "B", "latitude": 50.05, "longitude": 20.0 }
    ],
    "rails": [
        { "from": "B", "to": "A", "points": [[50.03, 20.0]] }
    ],
    "trains": [
        { "number": 101, "category": "IC", "stops": [
            { "station_name": "A", "track": { "platform": 1, "track": "1" }, "departure_time": "08:00:00" },
            { "station_name": "B", "track": { "platform": 1, "track": "1" }, "arrival_time": "08:10:00" }
        ] }
    ]
}"#;

fn config() -> Config {
    Config { start_time: Time::new(7, 59, 0), ..Config::default() }
}

fn simulation(json: &str) -> Simulation {
    let config = config();
    let network = get_network_string(json, &config).unwrap();
    Simulation::new(network, config)
}

fn timetables(sim: &Simulation) -> Vec<Vec<(Option<Time>, Option<Time>)>> {
    (0..sim.ctx.network.templates.len())
        .map(|t| sim.template_timetable(t).into_iter().map(|r| (r.real_arrival, r.real_departure)).collect())
        .collect()
}

#[test]
fn trains_run_their_whole_journey() {
    let mut sim = simulation(LINE);
    let h = evaluate_day(&mut sim, Some(Time::new(10, 0, 0))).unwrap();

    assert!(sim.ctx.live_trains().is_empty());
    assert!(sim.ctx.network.steps.iter().all(|s| s.satisfied()));
    assert!(sim.ctx.network.tracks.iter().all(|t| t.is_free()));
    assert!(sim.ctx.all_trains().all(|t| t.destroyed));

    for row in sim.template_timetable(0) {
        if let (Some(planned), Some(real)) = (row.planned_arrival, row.real_arrival) {
            assert!(real >= planned, "{} arrived early", row.station);
        }
        if let (Some(planned), Some(real)) = (row.planned_departure, row.real_departure) {
            assert!(real >= planned, "{} departed early", row.station);
        }
    }

    let added: Vec<Time> = h.events.iter()
        .filter(|e| match e.event { SimulationEvent::TrainAdded(_) => true, _ => false })
        .map(|e| e.time)
        .collect();
    assert_eq!(added.len(), 2);
    assert_eq!(added[0], Time::new(8, 0, 0));
    assert!(h.movements(&sim.ctx).contains("arr IC 101 B"));
    assert_eq!(h.steps.last().map(|s| s.live_trains), Some(0));
}

#[test]
fn no_track_holds_two_trains() {
    let mut sim = simulation(LINE);
    let violations = Rc::new(RefCell::new(Vec::new()));
    let seen = violations.clone();
    sim.subscribe(Box::new(move |event, ctx| {
        if let SimulationEvent::StepCompleted(now) = *event {
            let mut used: HashMap<usize, TrainId> = HashMap::new();
            for &id in ctx.live_trains() {
                if let Some(track) = ctx.train(id).and_then(|t| t.track()) {
                    if used.insert(track, id).is_some() {
                        seen.borrow_mut().push(now);
                    }
                    if ctx.network.tracks[track].train() != Some(id) {
                        seen.borrow_mut().push(now);
                    }
                }
            }
        }
    }));
    sim.run_until(Time::new(10, 0, 0)).unwrap();
    assert!(violations.borrow().is_empty(), "{:?}", violations.borrow());

    // Both start from the same track: the second spawn waits for the first departure.
    let first = sim.template_timetable(0);
    let second = sim.template_timetable(1);
    assert!(second[0].real_departure > first[0].real_departure);
}

#[test]
fn satisfied_steps_never_decrease() {
    let mut sim = simulation(LINE);
    let counts = Rc::new(RefCell::new(Vec::new()));
    let c = counts.clone();
    sim.subscribe(Box::new(move |event, ctx| {
        if let SimulationEvent::StepCompleted(_) = *event {
            c.borrow_mut().push(ctx.network.steps.iter().filter(|s| s.satisfied()).count());
        }
    }));
    sim.run_until(Time::new(9, 0, 0)).unwrap();
    let counts = counts.borrow();
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(counts.last(), Some(&6));
}

#[test]
fn reset_replays_the_same_day() {
    let mut sim = simulation(LINE);
    sim.run_until(Time::new(10, 0, 0)).unwrap();
    let first = timetables(&sim);

    let log = Rc::new(RefCell::new(History::new()));
    sim.subscribe(history::recorder(log.clone()));
    sim.run_until(Time::new(10, 30, 0)).unwrap();
    sim.reset();
    assert!(log.borrow().steps.is_empty());
    assert_eq!(sim.current_time(), Time::new(7, 59, 0));
    assert!(sim.ctx.live_trains().is_empty());
    assert!(sim.ctx.network.tracks.iter().all(|t| t.is_free()));
    assert!(sim.ctx.network.steps.iter().all(|s| !s.satisfied()));
    assert!(sim.ctx.network.templates.iter().all(|t| t.live.is_none()));

    sim.reset();
    sim.run_until(Time::new(10, 0, 0)).unwrap();
    assert_eq!(timetables(&sim), first);
}

#[test]
fn spawns_at_planned_departure() {
    let mut sim = simulation(LINE);
    sim.run_until(Time::new(7, 59, 45)).unwrap();
    assert_eq!(sim.trains().count(), 0);
    sim.step().unwrap();
    assert_eq!(sim.current_time(), Time::new(8, 0, 0));
    let numbers: HashSet<u32> = sim.trains().map(|t| sim.ctx.network.templates[t.template].number).collect();
    assert_eq!(numbers, hashset! { 101 });
    assert!(sim.train_by_number(101).is_some());
    assert!(sim.train_by_number(202).is_none());
}

#[test]
fn injected_delay_stalls_the_train() {
    let mut plain = simulation(LINE);
    plain.run_until(Time::new(10, 0, 0)).unwrap();
    let on_time = plain.template_timetable(0)[1].real_arrival.unwrap();

    let mut sim = simulation(LINE);
    sim.run_until(Time::new(8, 0, 30)).unwrap();
    let id = sim.train_by_number(101).unwrap();
    assert!(sim.train(id).unwrap().track().is_none());
    sim.add_delay(id, 900).unwrap();
    assert!(sim.add_delay(99, 10).is_err());

    for _ in 0..59 {
        sim.step().unwrap();
        assert!(!sim.train(id).unwrap().delay.user_delay_handled());
        assert_eq!(sim.train(id).unwrap().velocity, 0.0);
    }
    sim.step().unwrap();
    let delay = &sim.train(id).unwrap().delay;
    assert!(delay.user_delay_handled());
    assert_eq!(delay.external(), 900);

    sim.run_until(Time::new(10, 0, 0)).unwrap();
    let delayed = sim.template_timetable(0)[1].real_arrival.unwrap();
    // The undelayed train is held until its planned arrival, the delayed one is not.
    assert_eq!(on_time, Time::new(8, 10, 0));
    assert!(delayed - on_time >= 300, "{} vs {}", delayed, on_time);
}

#[test]
fn blocked_station_holds_arrivals() {
    let mut sim = simulation(LINE);
    let b = sim.station_by_name("B").unwrap();
    sim.block_station(b);
    sim.run_until(Time::new(8, 40, 0)).unwrap();

    let id = sim.train_by_number(101).unwrap();
    let train = sim.train(id).unwrap();
    assert!(train.waiting);
    assert!(train.delay.conflict() > 0);
    assert_eq!(sim.template_timetable(0)[1].real_arrival, None);
    assert!(sim.current_exceedance(id).unwrap() > 0);

    sim.unblock_station(b);
    sim.run_until(Time::new(8, 41, 0)).unwrap();
    assert!(sim.template_timetable(0)[1].real_arrival.is_some());
}

#[test]
fn day_end_stops_stepping() {
    let config = Config { start_time: Time::new(23, 59, 0), ..Config::default() };
    let network = get_network_string(LINE, &config).unwrap();
    let mut sim = Simulation::new(network, config);
    let steps = sim.run_until(Time::new(24, 0, 0)).unwrap();
    assert_eq!(steps, 3);
    assert_eq!(sim.current_time(), Time::new(23, 59, 45));
    assert_eq!(sim.step().unwrap(), StepOutcome::DayEnded);
    assert_eq!(sim.current_time(), Time::new(23, 59, 45));

    sim.set_auto_run(true);
    sim.run_automatically().unwrap();
    assert!(!sim.auto_run());
}

#[test]
fn category_parameters_can_be_changed() {
    let mut sim = simulation(LINE);
    sim.category_mut("ic").unwrap().max_velocity = 10.0;
    sim.run_until(Time::new(8, 5, 0)).unwrap();
    let id = sim.train_by_number(101).unwrap();
    assert!(sim.train(id).unwrap().velocity <= 10.0);
    assert!(sim.category_mut("nope").is_none());
}

#[test]
fn non_positive_time_step_never_steps() {
    for &dt in &[0, -15] {
        let config = Config { time_step: dt, ..config() };
        let network = get_network_string(LINE, &config).unwrap();
        let mut sim = Simulation::new(network, config);
        assert!(!sim.can_step());
        assert_eq!(sim.step().unwrap(), StepOutcome::DayEnded);
        assert_eq!(sim.run_until(Time::new(10, 0, 0)).unwrap(), 0);
        assert_eq!(sim.current_time(), Time::new(7, 59, 0));
    }
}

#[test]
fn auto_run_stops_at_requested_time() {
    let config = Config { auto_run_speed: 0, ..config() };
    let network = get_network_string(LINE, &config).unwrap();
    let mut sim = Simulation::new(network, config);
    sim.set_auto_run(true);
    let h = record_day(&mut sim, |sim| sim.run_automatically_until(Time::new(8, 1, 0))).unwrap();
    assert!(!sim.auto_run());
    assert_eq!(sim.current_time(), Time::new(8, 1, 0));
    assert_eq!(h.steps.len(), 8);

    // Without the flag nothing moves.
    sim.run_automatically_until(Time::new(8, 5, 0)).unwrap();
    assert_eq!(sim.current_time(), Time::new(8, 1, 0));
}

#[test]
fn failing_step_clears_auto_run() {
    let config = Config { auto_run_speed: 0, ..config() };
    let network = get_network_string(LINE, &config).unwrap();
    let mut sim = Simulation::new(network, config);
    sim.run_until(Time::new(10, 0, 0)).unwrap();

    // 101 has finished its day, so a fresh copy at A has no stop left there.
    let a = sim.station_by_name("A").unwrap();
    let track = sim.ctx.network.stations[a].spawns[&0].track;
    sim.ctx.add_train(0, track).unwrap();
    sim.set_auto_run(true);
    match sim.run_automatically() {
        Err(SimulationError::MissingSchedule { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert!(!sim.auto_run());
}

#[test]
fn positions_along_a_reversed_rail() {
    let mut sim = simulation(REVERSED);
    let a = sim.station_by_name("A").unwrap();
    let b = sim.station_by_name("B").unwrap();
    let (pa, pb) = (sim.ctx.network.stations[a].position, sim.ctx.network.stations[b].position);
    let length = pa.distance_to(&pb);

    sim.run_until(Time::new(8, 0, 0)).unwrap();
    let id = sim.train_by_number(101).unwrap();
    let train = sim.train(id).unwrap();
    assert_eq!(train.geo_position(&sim.ctx), pa);
    assert_eq!(train.distance_to_next_station(&sim.ctx), None);

    sim.run_until(Time::new(8, 1, 30)).unwrap();
    let train = sim.train(id).unwrap();
    let left = train.distance_to_next_station(&sim.ctx).unwrap();
    let here = train.geo_position(&sim.ctx);
    let travelled = here.distance_to(&pa);
    assert!(travelled > 0.0 && travelled < length / 2.0, "{} of {}", travelled, length);
    assert!((travelled + left - length).abs() < 1.0, "{} + {} vs {}", travelled, left, length);
    assert!((here.distance_to(&pb) - left).abs() < 1.0);

    sim.run_until(Time::new(8, 30, 0)).unwrap();
    assert!(sim.template_timetable(0)[1].real_arrival.is_some());
}
