use serde::{Deserialize, Serialize};

// The map's initial centre. A stored point equal to this is a placeholder,
// not a real GPS fix.
pub const DEFAULT_SENTINEL: Coordinate = Coordinate {
    latitude: 12.2958,
    longitude: 76.6394,
};

pub const DEFAULT_EPSILON: f64 = 1e-6;

/// A `(latitude, longitude)` pair in degrees. Serialized as a two element
/// array `[lat, lon]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Coordinate::new(latitude, longitude)
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(c: Coordinate) -> Self {
        (c.latitude, c.longitude)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// The smallest box covering every point, `None` for an empty input.
    pub fn covering<'a>(points: impl IntoIterator<Item = &'a Coordinate>) -> Option<Bounds> {
        let mut bounds: Option<Bounds> = None;
        for point in points {
            bounds = Some(match bounds {
                None => Bounds {
                    south: point.latitude,
                    west: point.longitude,
                    north: point.latitude,
                    east: point.longitude,
                },
                Some(b) => b.extend(point),
            });
        }
        bounds
    }

    pub fn extend(self, point: &Coordinate) -> Bounds {
        Bounds {
            south: self.south.min(point.latitude),
            west: self.west.min(point.longitude),
            north: self.north.max(point.latitude),
            east: self.east.max(point.longitude),
        }
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        point.latitude >= self.south
            && point.latitude <= self.north
            && point.longitude >= self.west
            && point.longitude <= self.east
    }
}

/// Decides which GPS samples are worth keeping. Rejects the null island
/// glitch, anything near the zero meridian/equator within `epsilon`, values
/// out of range and the placeholder `sentinel` location.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CoordinateFilter {
    pub sentinel: Coordinate,
    pub epsilon: f64,
}

impl Default for CoordinateFilter {
    fn default() -> Self {
        CoordinateFilter {
            sentinel: DEFAULT_SENTINEL,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl CoordinateFilter {
    pub fn accepts(&self, c: &Coordinate) -> bool {
        let Coordinate {
            latitude: lat,
            longitude: lon,
        } = *c;
        if !lat.is_finite() || !lon.is_finite() {
            return false;
        }
        lat != 0.
            && lon != 0.
            && !self.is_sentinel(c)
            && lat.abs() > self.epsilon
            && lon.abs() > self.epsilon
            && (-90. ..=90.).contains(&lat)
            && (-180. ..=180.).contains(&lon)
    }

    pub fn is_sentinel(&self, c: &Coordinate) -> bool {
        c.latitude == self.sentinel.latitude && c.longitude == self.sentinel.longitude
    }
}
