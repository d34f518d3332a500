//! Quantities and compass directions extracted from utterances

use crate::Result;
use regex::Regex;

/// Degrees of latitude per meter of northward travel (small-distance approximation)
pub const LAT_DEG_PER_METER: f64 = 0.000009;

/// Degrees of longitude per meter of eastward travel (small-distance approximation)
pub const LON_DEG_PER_METER: f64 = 0.000011;

/// Cardinal directions for relative moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// First direction keyword found, checked north, south, east, west.
    pub fn find_in(lower: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| lower.contains(d.as_str()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    /// Offset a position by `distance_m` in this direction.
    ///
    /// Uses fixed degree-per-meter factors; not geodesically exact.
    pub fn offset(&self, lat: f64, lon: f64, distance_m: f64) -> (f64, f64) {
        match self {
            Direction::North => (lat + LAT_DEG_PER_METER * distance_m, lon),
            Direction::South => (lat - LAT_DEG_PER_METER * distance_m, lon),
            Direction::East => (lat, lon + LON_DEG_PER_METER * distance_m),
            Direction::West => (lat, lon - LON_DEG_PER_METER * distance_m),
        }
    }
}

/// Finds "<number> m / meters / metres" in free text
#[derive(Debug, Clone)]
pub struct QuantityExtractor {
    meters: Regex,
}

impl QuantityExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            meters: Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:m|meters?|metres?)\b")?,
        })
    }

    /// First distance in meters mentioned in `text`. Values that overflow
    /// to infinity count as absent.
    pub fn meters(&self, text: &str) -> Option<f64> {
        self.meters
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_extraction() {
        let q = QuantityExtractor::new().unwrap();
        assert_eq!(q.meters("take off to 25 meters"), Some(25.0));
        assert_eq!(q.meters("climb 12.5m"), Some(12.5));
        assert_eq!(q.meters("fly north 1 Meter"), Some(1.0));
        assert_eq!(q.meters("go 40 metres west"), Some(40.0));
        assert_eq!(q.meters("fly north"), None);
        assert_eq!(q.meters("wait 5 minutes"), None);

        let huge = format!("take off to {} meters", "9".repeat(400));
        assert_eq!(q.meters(&huge), None);
    }

    #[test]
    fn test_direction_priority() {
        assert_eq!(Direction::find_in("fly north"), Some(Direction::North));
        assert_eq!(Direction::find_in("fly west then south"), Some(Direction::South));
        assert_eq!(Direction::find_in("fly up"), None);
    }

    #[test]
    fn test_offsets() {
        let (lat, lon) = Direction::North.offset(10.0, 20.0, 50.0);
        assert!((lat - 10.00045).abs() < 1e-12);
        assert_eq!(lon, 20.0);

        let (lat, lon) = Direction::West.offset(10.0, 20.0, 100.0);
        assert_eq!(lat, 10.0);
        assert!((lon - 19.9989).abs() < 1e-12);
    }
}
