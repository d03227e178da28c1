use maplit::*;
use railday::config::Config;
use railday::railway::station::Bound;
use railday::railway::time::Time;
use railday::railway::{SimulationContext, SimulationError, StationId, TrackId, TrainId};
use railday::*;
use std::collections::HashSet;

// Stops at B: 101 IC on 1/1, 102 BUS on 1/1, 103 IC passes through, 104 R on
// 1/1, 105 R on 1/2, 106 OS on 1/3.
const JUNCTION: &str = r#"{
    "stations": [
        { "name": "A", "latitude": 50.00, "longitude": 20.0 },
        { "name": "B", "latitude": 50.05, "longitude": 20.0 },
        { "name": "C", "latitude": 50.10, "longitude": 20.0 }
    ],
    "trains": [
        { "number": 101, "category": "IC", "stops": [
            { "station_name": "A", "track": { "platform": 1, "track": "1" }, "departure_time": "07:50:00" },
            { "station_name": "B", "track": { "platform": 1, "track": "1" },
              "arrival_time": "08:05:00", "departure_time": "08:25:00" },
            { "station_name": "C", "arrival_time": "08:40:00" }
        ] },
        { "number": 102, "category": "BUS", "stops": [
            { "station_name": "A", "track": { "platform": 2, "track": "1" }, "departure_time": "08:00:00" },
            { "station_name": "B", "track": { "platform": 1, "track": "1" },
              "arrival_time": "08:11:00", "departure_time": "08:21:00" },
            { "station_name": "C", "arrival_time": "08:31:00" }
        ] },
        { "number": 103, "category": "IC", "stops": [
            { "station_name": "A", "track": { "platform": 3, "track": "1" }, "departure_time": "08:00:00" },
            { "station_name": "B" },
            { "station_name": "C", "arrival_time": "08:30:00" }
        ] },
        { "number": 104, "category": "R", "stops": [
            { "station_name": "A", "track": { "platform": 4, "track": "1" }, "departure_time": "08:00:00" },
            { "station_name": "B", "track": { "platform": 1, "track": "1" },
              "arrival_time": "08:10:00", "departure_time": "08:20:00" },
            { "station_name": "C", "arrival_time": "08:40:00" }
        ] },
        { "number": 105, "category": "R", "stops": [
            { "station_name": "A", "track": { "platform": 5, "track": "1" }, "departure_time": "08:00:00" },
            { "station_name": "B", "track": { "platform": 1, "track": "2" },
              "arrival_time": "08:10:00", "departure_time": "08:20:00" },
            { "station_name": "C", "arrival_time": "08:40:00" }
        ] },
        { "number": 106, "category": "OS", "stops": [
            { "station_name": "A", "track": { "platform": 6, "track": "1" }, "departure_time": "07:50:00" },
            { "station_name": "B", "track": { "platform": 1, "track": "3" },
              "arrival_time": "08:05:00", "departure_time": "08:15:00" },
            { "station_name": "C", "arrival_time": "08:40:00" }
        ] }
    ]
}"#;

fn context() -> SimulationContext {
    let config = Config::default();
    let network = get_network_string(JUNCTION, &config).unwrap();
    SimulationContext::new(network, config)
}

fn station(ctx: &SimulationContext, name: &str) -> StationId {
    ctx.network.station_by_name(name).unwrap()
}

fn track(ctx: &SimulationContext, station: &str, platform: u32, number: &str) -> TrackId {
    let s = self::station(ctx, station);
    ctx.network.stations[s].tracks.iter().cloned()
        .find(|&t| ctx.network.tracks[t].platform == platform && ctx.network.tracks[t].number == number)
        .unwrap()
}

#[test]
fn station_tracks_are_collected() {
    let ctx = context();
    let b = station(&ctx, "B");
    let names: Vec<(u32, String)> = ctx.network.stations[b].tracks.iter()
        .map(|&t| (ctx.network.tracks[t].platform, ctx.network.tracks[t].number.clone()))
        .collect();
    assert_eq!(names, vec![(1, "1".to_string()), (0, "?".to_string()),
                           (1, "2".to_string()), (1, "3".to_string())]);
}

#[test]
fn track_assignment_rules() {
    let mut ctx = context();
    let b = station(&ctx, "B");
    let (b1, b2, b3) = (track(&ctx, "B", 1, "1"), track(&ctx, "B", 1, "2"), track(&ctx, "B", 1, "3"));
    let placeholder = track(&ctx, "B", 0, "?");

    assert_eq!(ctx.assign_track(b, b1, 3), Ok(Some(b1)));

    ctx.add_train(0, b1).unwrap();
    // A bus only ever takes its own track.
    assert_eq!(ctx.assign_track(b, b1, 1), Ok(None));
    // Others move to the first free real track.
    assert_eq!(ctx.assign_track(b, b1, 3), Ok(Some(b2)));

    ctx.add_train(4, b2).unwrap();
    ctx.add_train(5, b3).unwrap();
    // Stopping trains never use the placeholder while real tracks exist...
    assert_eq!(ctx.assign_track(b, b1, 3), Ok(None));
    // ...trains passing through do.
    assert_eq!(ctx.assign_track(b, b1, 2), Ok(Some(placeholder)));

    ctx.network.stations[b].block_all_tracks();
    assert_eq!(ctx.assign_track(b, placeholder, 2), Ok(None));
    ctx.network.stations[b].unblock_all_tracks();
    assert_eq!(ctx.assign_track(b, placeholder, 2), Ok(Some(placeholder)));

    let a1 = track(&ctx, "A", 1, "1");
    match ctx.assign_track(b, a1, 0) {
        Err(SimulationError::ForeignTrack { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
    match ctx.add_train(3, b1) {
        Err(SimulationError::TrackOccupied { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn waits_only_for_important_late_trains() {
    let mut ctx = context();
    let b = station(&ctx, "B");
    let a = station(&ctx, "A");
    ctx.clock = Time::new(8, 21, 0);

    // 104 R stands at B, due out at 08:20. 101 IC is still at A.
    let r = ctx.add_train(3, track(&ctx, "B", 1, "1")).unwrap();
    let ic = ctx.add_train(0, ctx.network.stations[a].spawns[&0].track).unwrap();
    let os = ctx.add_train(5, ctx.network.stations[a].spawns[&5].track).unwrap();

    // 105 is overdue as well but not running.
    assert_eq!(ctx.late_trains(b), vec![r, os]);

    let mut waiting = ctx.train(r).unwrap().clone();
    assert!(waiting.should_wait_longer(ctx.train(ic).unwrap(), &ctx));
    assert!(!waiting.should_wait_longer(ctx.train(os).unwrap(), &ctx));
    assert_eq!(ctx.current_exceeding_time(b, &mut waiting, Bound::Departure), 60);

    // 101 is now later than the gap between the two departures.
    ctx.clock = Time::new(8, 31, 0);
    assert!(!waiting.should_wait_longer(ctx.train(ic).unwrap(), &ctx));
    let late: HashSet<TrainId> = ctx.late_trains(b).into_iter().collect();
    assert_eq!(late, hashset! { ic, r, os });
}

#[test]
fn equal_departures_do_not_wait_for_each_other() {
    let mut ctx = context();
    let b = station(&ctx, "B");
    ctx.clock = Time::new(8, 21, 0);

    // 104 and 105 are both due out of B at 08:20, on different tracks.
    let first = ctx.add_train(3, track(&ctx, "B", 1, "1")).unwrap();
    let second = ctx.add_train(4, track(&ctx, "B", 1, "2")).unwrap();
    let late: HashSet<TrainId> = ctx.late_trains(b).into_iter().collect();
    assert_eq!(late, hashset! { first, second });

    let mut waiting = ctx.train(first).unwrap().clone();
    assert!(!waiting.should_wait_longer(ctx.train(second).unwrap(), &ctx));
    let mut waiting = ctx.train(second).unwrap().clone();
    assert!(!waiting.should_wait_longer(ctx.train(first).unwrap(), &ctx));
}

#[test]
fn upcoming_movements_per_track() {
    let ctx = context();
    let b1 = track(&ctx, "B", 1, "1");
    let b3 = track(&ctx, "B", 1, "3");
    let at = Time::new(8, 0, 0);

    let arrival = ctx.next_arrival_for_track(b1, at).unwrap();
    assert_eq!(ctx.network.steps[arrival].arrival, Some(Time::new(8, 5, 0)));
    let departure = ctx.next_departure_for_track(b1, at).unwrap();
    assert_eq!(ctx.network.steps[departure].departure, Some(Time::new(8, 20, 0)));

    assert!(ctx.next_arrival_for_track(b3, Time::new(8, 6, 0)).is_none());
    assert_eq!(ctx.next_departure_for_track(b3, Time::new(8, 15, 0)).map(|s| ctx.network.steps[s].template),
               Some(5));
}
