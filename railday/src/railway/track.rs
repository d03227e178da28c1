use super::{StationId, TrainId};

/// Platform number of tracks synthesized for stops without track information.
pub const PLACEHOLDER_PLATFORM: u32 = 0;

/// A single platform track, holding at most one train.
#[derive(Clone, Debug)]
pub struct Track {
    pub station: StationId,
    pub platform: u32,
    /// May contain letters, e.g. "2a".
    pub number: String,
    train: Option<TrainId>,
}

impl Track {
    pub fn new(station: StationId, platform: u32, number: &str) -> Track {
        Track { station, platform, number: number.to_string(), train: None }
    }

    pub fn is_placeholder(&self) -> bool {
        self.platform == PLACEHOLDER_PLATFORM
    }

    pub fn train(&self) -> Option<TrainId> {
        self.train
    }

    pub fn is_free(&self) -> bool {
        self.train.is_none()
    }

    /// Binds the train. Returns false if the track is already occupied.
    pub fn occupy(&mut self, train: TrainId) -> bool {
        if self.train.is_some() {
            return false;
        }
        self.train = Some(train);
        true
    }

    /// Clears the track unconditionally, returning the previous occupant.
    pub fn depart(&mut self) -> Option<TrainId> {
        self.train.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_occupant() {
        let mut t = Track::new(0, 1, "2");
        assert!(t.occupy(4));
        assert!(!t.occupy(5));
        assert_eq!(t.train(), Some(4));
        assert_eq!(t.depart(), Some(4));
        assert_eq!(t.depart(), None);
        assert!(t.is_free());
        assert!(Track::new(0, PLACEHOLDER_PLATFORM, "?").is_placeholder());
    }
}
