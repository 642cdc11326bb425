use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::error::{invalid_coordinates_error, Error};

/// A position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Rejects non-finite components and anything outside the WGS84 ranges.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(invalid_coordinates_error());
        }

        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err(invalid_coordinates_error());
        }

        Ok(())
    }

    /// Planar distance in degrees, treating lat/lng differences as cartesian.
    pub fn planar_distance(&self, other: &Coordinates) -> f64 {
        let delta = Point::from(*other) - Point::from(*self);

        delta.x().hypot(delta.y())
    }

    pub fn offset(&self, dlat: f64, dlng: f64) -> Self {
        Self {
            lat: self.lat + dlat,
            lng: self.lng + dlng,
        }
    }
}

impl From<Coordinates> for Point<f64> {
    fn from(coordinates: Coordinates) -> Self {
        Point::new(coordinates.lng, coordinates.lat)
    }
}

impl From<Point<f64>> for Coordinates {
    fn from(point: Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lng: point.x(),
        }
    }
}

#[test]
fn validate_rejects_non_finite_and_out_of_range() {
    assert!(Coordinates::new(-23.5505, -46.6333).validate().is_ok());
    assert!(Coordinates::new(90.0, 180.0).validate().is_ok());

    for bad in [
        Coordinates::new(f64::NAN, 0.0),
        Coordinates::new(0.0, f64::INFINITY),
        Coordinates::new(90.5, 0.0),
        Coordinates::new(0.0, -180.1),
    ] {
        assert!(bad.validate().unwrap_err().is_invalid_coordinates_error());
    }
}

#[test]
fn planar_distance_is_euclidean_in_degrees() {
    let home = Coordinates::new(0.0, 0.0);
    let current = Coordinates::new(0.003, 0.004);

    assert!((home.planar_distance(&current) - 0.005).abs() < 1e-12);
    assert_eq!(home.planar_distance(&home), 0.0);
}

#[test]
fn point_conversion_uses_lng_as_x() {
    let point: Point<f64> = Coordinates::new(1.0, 2.0).into();

    assert_eq!(point.x(), 2.0);
    assert_eq!(point.y(), 1.0);
    assert_eq!(Coordinates::from(point), Coordinates::new(1.0, 2.0));
}
