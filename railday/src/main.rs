#[macro_use] extern crate log;

use railday::config::Config;
use railday::railway::time::Time;
use railday::sim::Simulation;
use railday::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use structopt::StructOpt;

/// Railday -- one day of passenger rail traffic
#[derive(StructOpt, Debug)]
#[structopt(name = "railday")]
struct Opt {
    /// Verbose mode (-v, -vv, -vvv)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,

    /// Network file in JSON format
    #[structopt(parse(from_os_str))]
    network: PathBuf,

    /// Configuration file in JSON format
    #[structopt(short = "c", long = "config", parse(from_os_str))]
    config: Option<PathBuf>,

    /// Seconds of simulated time per step
    #[structopt(short = "d", long = "time-step")]
    time_step: Option<i64>,

    /// Clock time the simulation starts at (HH:MM[:SS])
    #[structopt(short = "s", long = "start")]
    start: Option<Time>,

    /// Clock time to stop at, default is the end of the day
    #[structopt(short = "u", long = "until")]
    until: Option<Time>,

    /// Step in real time at the configured auto-run speed
    #[structopt(short = "a", long = "auto-run")]
    auto_run: bool,

    /// Output JSON history file
    #[structopt(short = "j", long = "json", parse(from_os_str))]
    json: Option<PathBuf>,

    /// Output JSON history as JavaScript
    #[structopt(short = "J", long = "javascript", parse(from_os_str))]
    javascript: Option<PathBuf>,

    /// Output realized timetables as JSON
    #[structopt(short = "t", long = "timetable", parse(from_os_str))]
    timetable: Option<PathBuf>,
}

fn run(opt: &Opt) -> AppResult<()> {
    let mut config = match opt.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(dt) = opt.time_step {
        config.time_step = dt;
    }
    if let Some(start) = opt.start {
        config.start_time = start;
    }
    config.validate()?;
    debug!("{:?}", config);

    let network = get_network(&opt.network, &config)?;
    let mut sim = Simulation::new(network, config);

    let history = if opt.auto_run {
        sim.set_auto_run(true);
        let until = opt.until.unwrap_or_else(|| Time::from_seconds(sim.config().day_length));
        record_day(&mut sim, |sim| sim.run_automatically_until(until))?
    } else {
        evaluate_day(&mut sim, opt.until)?
    };

    if opt.verbose >= 1 {
        print!("{}", history.movements(&sim.ctx));
    }
    if let Some(last) = history.steps.last() {
        println!("{}: {} trains running, mean delay {:.0} s, max {} s",
                 last.time, last.live_trains, last.mean_delay, last.max_delay);
    }

    if let Some(ref json) = opt.json {
        let file = File::create(json)?;
        let mut writer = BufWriter::new(&file);
        output::json::json_history(&history, &mut writer)?;
        writer.flush()?;
    }

    if let Some(ref javascript) = opt.javascript {
        let file = File::create(javascript)?;
        let mut writer = BufWriter::new(&file);
        output::json::javascript_history(&history, &mut writer)?;
        writer.flush()?;
    }

    if let Some(ref timetable) = opt.timetable {
        let file = File::create(timetable)?;
        let mut writer = BufWriter::new(&file);
        output::json::json_timetables(&sim, &mut writer)?;
        writer.flush()?;
    }

    Ok(())
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn main() {
    let opt = Opt::from_args();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level(opt.verbose))).init();
    match run(&opt) {
        Ok(()) => {}
        Err(e) => {
            error!("{}", e);
            println!("Error:\n{}", e.as_fail());
            std::process::exit(1);
        }
    }
}
