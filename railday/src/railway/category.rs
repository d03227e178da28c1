use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Priority rank of a train category. A lower rank is a more important train,
/// so `Priority(1) > Priority(6)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Priority(pub u32);

impl Ord for Priority {
    fn cmp(&self, other: &Priority) -> Ordering {
        other.0.cmp(&self.0)
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Priority) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainCategory {
    pub code: String,
    pub full_name: String,
    pub priority: Priority,
    /// Seconds of lateness after which a train stops waiting for connections.
    pub max_waiting_time: i64,
    /// m/s
    pub max_velocity: f64,
    /// m/s^2
    pub acceleration: f64,
    /// Bus-like services only ever use their own stop.
    #[serde(default)]
    pub skips_rules: bool,
}

impl TrainCategory {
    pub fn new(code: &str, full_name: &str, priority: u32, max_waiting_time: i64,
               max_velocity: f64, acceleration: f64) -> TrainCategory {
        TrainCategory {
            code: code.to_string(),
            full_name: full_name.to_string(),
            priority: Priority(priority),
            max_waiting_time,
            max_velocity,
            acceleration,
            skips_rules: false,
        }
    }

    fn bus(mut self) -> TrainCategory {
        self.skips_rules = true;
        self
    }
}

pub const DEFAULT_CATEGORY: &str = "default";

/// Category lookup by case-insensitive code.
#[derive(Clone, Debug)]
pub struct CategoryTable {
    categories: HashMap<String, TrainCategory>,
}

impl Default for CategoryTable {
    fn default() -> CategoryTable {
        let defaults = vec![
            TrainCategory::new("EIP", "Express InterCity Premium", 1, 20 * 60, 55.6, 0.6),
            TrainCategory::new("EIC", "Express InterCity", 2, 25 * 60, 55.6, 0.5),
            TrainCategory::new("EC", "EuroCity", 2, 30 * 60, 55.6, 0.5),
            TrainCategory::new("EN", "EuroNight", 3, 35 * 60, 44.4, 0.3),
            TrainCategory::new("IC", "InterCity", 3, 30 * 60, 44.4, 0.4),
            TrainCategory::new("D", "Long-distance", 4, 35 * 60, 44.4, 0.35),
            TrainCategory::new("TLK", "Tanie Linie Kolejowe", 4, 35 * 60, 38.9, 0.35),
            TrainCategory::new("IR", "InterRegio", 5, 30 * 60, 38.9, 0.35),
            TrainCategory::new("AR", "Accelerated Regional", 5, 25 * 60, 38.9, 0.45),
            TrainCategory::new("R", "Regio", 6, 20 * 60, 33.3, 0.4),
            TrainCategory::new("KM", "Koleje Mazowieckie", 6, 20 * 60, 33.3, 0.4),
            TrainCategory::new("KD", "Koleje Dolnoslaskie", 6, 20 * 60, 44.4, 0.45),
            TrainCategory::new("LE", "Lokalny Ekspres", 6, 20 * 60, 33.3, 0.45),
            TrainCategory::new("SKM", "Szybka Kolej Miejska", 6, 15 * 60, 30.6, 0.5),
            TrainCategory::new("SKW", "Szybka Kolej Miejska Warszawa", 6, 15 * 60, 30.6, 0.55),
            TrainCategory::new("WKD", "Warszawska Kolej Dojazdowa", 6, 10 * 60, 25.0, 0.6),
            TrainCategory::new("ZKA", "Replacement bus", 6, 20 * 60, 33.3, 0.4).bus(),
            TrainCategory::new("L", "Local", 7, 15 * 60, 30.6, 0.35),
            TrainCategory::new("LS", "Seasonal local", 7, 15 * 60, 30.6, 0.35),
            TrainCategory::new("KS", "Koleje Slaskie", 7, 15 * 60, 30.6, 0.35),
            TrainCategory::new("KW", "Koleje Wielkopolskie", 7, 15 * 60, 30.6, 0.35),
            TrainCategory::new("LP", "Suburban line", 7, 15 * 60, 30.6, 0.35),
            TrainCategory::new("KML", "Kolej Metropolitalna", 7, 15 * 60, 30.6, 0.35),
            TrainCategory::new("OS", "Passenger", 8, 15 * 60, 30.6, 0.3),
            TrainCategory::new("BUS", "Bus", 9, 10 * 60, 22.2, 0.25).bus(),
            TrainCategory::new("DEFAULT", "Unknown category", 10, 15 * 60, 27.8, 0.3),
        ];
        CategoryTable {
            categories: defaults.into_iter().map(|c| (c.code.to_lowercase(), c)).collect(),
        }
    }
}

impl CategoryTable {
    pub fn insert(&mut self, category: TrainCategory) {
        self.categories.insert(category.code.to_lowercase(), category);
    }

    pub fn get(&self, code: &str) -> Option<&TrainCategory> {
        self.categories.get(&code.to_lowercase())
    }

    /// Unknown codes fall back to the default category.
    pub fn lookup(&self, code: &str) -> TrainCategory {
        match self.get(code) {
            Some(c) => c.clone(),
            None => {
                warn!("Unknown train category {:?}, using default", code);
                self.get(DEFAULT_CATEGORY).cloned()
                    .unwrap_or_else(|| TrainCategory::new("DEFAULT", "Unknown category", 10, 15 * 60, 27.8, 0.3))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }
}
