use super::category::TrainCategory;
use super::rail::{Position, Rail};
use super::schedule::{SpawnStep, TrainScheduleStep, TrainTemplate};
use super::station::Station;
use super::track::Track;
use super::*;
use std::collections::HashMap;
use std::fmt;

/// ID-indexed storage of everything the importer builds. Topology is fixed for the
/// lifetime of a simulation; only track occupancy, realized schedule times, spawn
/// history and blocking change while it runs.
#[derive(Clone, Default)]
pub struct Network {
    pub categories: Vec<TrainCategory>,
    pub templates: Vec<TrainTemplate>,
    pub stations: Vec<Station>,
    pub tracks: Vec<Track>,
    pub rails: Vec<Rail>,
    pub steps: Vec<TrainScheduleStep>,
    station_names: HashMap<String, StationId>,
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "Network {{ stations: {}, tracks: {}, rails: {}, templates: {}, steps: {} }}",
               self.stations.len(),
               self.tracks.len(),
               self.rails.len(),
               self.templates.len(),
               self.steps.len())
    }
}

impl Network {
    pub fn new() -> Network {
        Default::default()
    }

    pub fn add_station(&mut self, name: &str, position: Position, importance: f64) -> StationId {
        let id = self.stations.len();
        self.stations.push(Station::new(name, position, importance));
        self.station_names.insert(name.to_string(), id);
        id
    }

    pub fn station_by_name(&self, name: &str) -> Option<StationId> {
        self.station_names.get(name).cloned()
    }

    /// Returns the existing track with the same platform and number, if any.
    pub fn add_track(&mut self, station: StationId, platform: u32, number: &str) -> TrackId {
        let existing = self.stations[station].tracks.iter().cloned()
            .find(|&t| self.tracks[t].platform == platform && self.tracks[t].number == number);
        if let Some(t) = existing {
            return t;
        }
        let id = self.tracks.len();
        self.tracks.push(Track::new(station, platform, number));
        self.stations[station].tracks.push(id);
        id
    }

    pub fn add_rail(&mut self, rail: Rail) -> RailId {
        self.rails.push(rail);
        self.rails.len() - 1
    }

    /// A rail connecting the two stations in either direction.
    pub fn rail_between(&self, a: StationId, b: StationId) -> Option<RailId> {
        self.rails.iter().position(|r| (r.from == a && r.to == b) || (r.from == b && r.to == a))
    }

    pub fn add_category(&mut self, category: TrainCategory) -> CategoryId {
        if let Some(i) = self.categories.iter().position(|c| c.code == category.code) {
            return i;
        }
        self.categories.push(category);
        self.categories.len() - 1
    }

    pub fn add_template(&mut self, template: TrainTemplate) -> TemplateId {
        self.templates.push(template);
        self.templates.len() - 1
    }

    /// Appends a stop to the template's authored stop list and to the station's
    /// schedule for that template.
    pub fn add_schedule_step(&mut self, step: TrainScheduleStep) -> StepId {
        let id = self.steps.len();
        let (template, station) = (step.template, step.station);
        self.steps.push(step);
        self.templates[template].stops.push(id);
        self.stations[station].schedules.entry(template).or_insert_with(Vec::new).push(id);
        id
    }

    pub fn add_spawn(&mut self, station: StationId, template: TemplateId, spawn: SpawnStep) {
        self.stations[station].spawns.insert(template, spawn);
    }

    /// The first not yet satisfied step of the template at the station.
    pub fn current_step(&self, station: StationId, template: TemplateId) -> Option<StepId> {
        self.stations[station].schedules.get(&template)?
            .iter().cloned()
            .find(|&s| !self.steps[s].satisfied())
    }

    pub fn category_of(&self, template: TemplateId) -> &TrainCategory {
        &self.categories[self.templates[template].category]
    }

    pub fn display_name(&self, template: TemplateId) -> String {
        let t = &self.templates[template];
        match t.name {
            Some(ref name) => format!("{} {} \"{}\"", self.categories[t.category].code, t.number, name),
            None => format!("{} {}", self.categories[t.category].code, t.number),
        }
    }

    /// Clears all run state: occupancy, realized times, spawn history, blocking and
    /// the live-train back-references.
    pub fn reset(&mut self) {
        for station in self.stations.iter_mut() {
            station.reset();
        }
        for track in self.tracks.iter_mut() {
            track.depart();
        }
        for step in self.steps.iter_mut() {
            step.reset();
        }
        for template in self.templates.iter_mut() {
            template.live = None;
        }
    }
}
