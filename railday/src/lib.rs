#[macro_use] extern crate log;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate failure_derive;
extern crate failure;

pub mod config;
pub mod input;
pub mod output;
pub mod railway;
pub mod sim;

use crate::config::Config;
use crate::output::history::{self, History};
use crate::railway::network::Network;
use crate::railway::time::Time;
use crate::railway::SimulationError;
use crate::sim::Simulation;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub type AppResult<T> = Result<T, failure::Error>;

pub fn read_file(f: &Path) -> AppResult<String> {
    use std::fs::File;
    use std::io::prelude::*;
    use std::io::BufReader;

    let file = File::open(f)?;
    let mut file = BufReader::new(&file);
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

pub fn get_network(f: &Path, config: &Config) -> AppResult<Network> {
    let contents = read_file(f)?;
    get_network_string(&contents, config)
}

pub fn get_network_string(s: &str, config: &Config) -> AppResult<Network> {
    let desc = input::network::NetworkDescription::from_json(s)?;
    let network = input::builder::build_network(&desc, config)?;
    Ok(network)
}

/// Runs a simulation from its current clock until `until` (or the end of the
/// day) and returns what happened on the way.
pub fn evaluate_day(sim: &mut Simulation, until: Option<Time>) -> AppResult<History> {
    let until = until.unwrap_or_else(|| Time::from_seconds(sim.config().day_length));
    record_day(sim, |sim| {
        let steps = sim.run_until(until)?;
        info!("Simulated {} steps, clock at {}", steps, sim.current_time());
        Ok(())
    })
}

/// Records the history of whatever `run` does to the simulation.
pub fn record_day<F>(sim: &mut Simulation, run: F) -> AppResult<History>
    where F: FnOnce(&mut Simulation) -> Result<(), SimulationError>
{
    let log = Rc::new(RefCell::new(History::new()));
    let listener = sim.subscribe(history::recorder(log.clone()));
    let result = run(sim);
    sim.unsubscribe(listener);
    result?;
    Ok(log.replace(History::new()))
}
