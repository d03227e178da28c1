use super::StationId;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS: f64 = 6_371_000.0;

/// Geographic point, latitude/longitude in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Position {
        Position { latitude, longitude }
    }

    /// Great-circle distance in meters.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS * a.sqrt().asin()
    }

    pub fn interpolate(&self, other: &Position, t: f64) -> Position {
        Position {
            latitude: self.latitude + (other.latitude - self.latitude) * t,
            longitude: self.longitude + (other.longitude - self.longitude) * t,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// Travelling from the rail's `from` station to its `to` station.
    Forward,
    Backward,
}

/// Piecewise-linear connection between two stations with a speed limit per segment.
#[derive(Clone, Debug)]
pub struct Rail {
    pub from: StationId,
    pub to: StationId,
    /// All points including both station endpoints.
    points: Vec<Position>,
    max_speeds: Vec<f64>,
    /// Cumulative distance at the end of each segment.
    cumulative: Vec<f64>,
}

impl Rail {
    /// `points` includes the endpoints. Speeds must already be numeric, one per segment.
    pub fn new(from: StationId, to: StationId, points: Vec<Position>, max_speeds: Vec<f64>) -> Rail {
        assert!(points.len() >= 2, "rail needs at least two points");
        assert_eq!(points.len() - 1, max_speeds.len(), "one speed limit per segment");
        assert!(max_speeds.iter().all(|v| !v.is_nan()));
        let mut total = 0.0;
        let cumulative = points.windows(2).map(|w| {
            total += w[0].distance_to(&w[1]);
            total
        }).collect();
        Rail { from, to, points, max_speeds, cumulative }
    }

    pub fn length(&self) -> f64 {
        *self.cumulative.last().unwrap_or(&0.0)
    }

    pub fn segment_count(&self) -> usize {
        self.max_speeds.len()
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    /// Segment index and the distance already covered inside it.
    /// Distances past the end map to the end of the last segment.
    pub fn segment_at(&self, distance: f64) -> (usize, f64) {
        let last = self.cumulative.len() - 1;
        let idx = match self.cumulative
            .binary_search_by_key(&OrderedFloat(distance), |&c| OrderedFloat(c)) {
            // Exactly on a segment boundary belongs to the next segment.
            Ok(i) => (i + 1).min(last),
            Err(i) => i.min(last),
        };
        let start = if idx == 0 { 0.0 } else { self.cumulative[idx - 1] };
        let inside = (distance.max(0.0) - start).min(self.cumulative[idx] - start);
        (idx, inside)
    }

    pub fn position_at(&self, distance: f64) -> Position {
        let (idx, inside) = self.segment_at(distance);
        let start = if idx == 0 { 0.0 } else { self.cumulative[idx - 1] };
        let len = self.cumulative[idx] - start;
        let t = if len > 0.0 { inside / len } else { 0.0 };
        self.points[idx].interpolate(&self.points[idx + 1], t)
    }

    /// Speed limit in m/s at the given distance from the `from` end.
    pub fn max_speed(&self, distance: f64) -> f64 {
        self.max_speeds[self.segment_at(distance).0]
    }

    pub fn direction_from(&self, station: StationId) -> Direction {
        if self.from == station { Direction::Forward } else { Direction::Backward }
    }

    /// Convert distance travelled in the given direction into distance from the `from` end.
    pub fn oriented(&self, direction: Direction, travelled: f64) -> f64 {
        match direction {
            Direction::Forward => travelled,
            Direction::Backward => self.length() - travelled,
        }
    }
}
