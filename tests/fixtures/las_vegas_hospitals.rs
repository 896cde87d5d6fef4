//! Las Vegas area hospitals.
//!
//! Coordinates are approximate building positions, close enough to snap to
//! the road network in the OSRM Nevada dataset.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }
}

pub const HOSPITALS: &[Location] = &[
    Location::new("Sunrise Hospital and Medical Center", 36.1336, -115.1363),
    Location::new("University Medical Center", 36.1596, -115.1681),
    Location::new("Valley Hospital Medical Center", 36.1622, -115.1626),
    Location::new("Desert Springs Hospital", 36.1306, -115.1176),
    Location::new("Spring Valley Hospital", 36.1080, -115.2470),
    Location::new("Summerlin Hospital", 36.1839, -115.3089),
    Location::new("Southern Hills Hospital", 36.0735, -115.2605),
    Location::new("MountainView Hospital", 36.2185, -115.2423),
    Location::new("North Vista Hospital", 36.1914, -115.1208),
    Location::new("St. Rose Dominican Siena", 36.0120, -115.1136),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_in_vegas_area() {
        for loc in HOSPITALS {
            assert!(loc.lat > 35.9 && loc.lat < 36.3, "{} lat out of range: {}", loc.name, loc.lat);
            assert!(loc.lng > -115.4 && loc.lng < -114.8, "{} lng out of range: {}", loc.name, loc.lng);
        }
    }
}
