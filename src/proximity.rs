use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;
use crate::error::{invalid_coordinates_error, Error};

/// Meters per degree, approximated at the reference latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

pub const VERY_FAR_METERS: f64 = 500.0;
pub const FAR_METERS: f64 = 200.0;
pub const VERY_NEAR_METERS: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Inactive,
    VeryFar,
    FarFromHome,
    NearHome,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inactive => "Inactive",
            Self::VeryFar => "Very far",
            Self::FarFromHome => "Far from home",
            Self::NearHome => "Near home",
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Self::VeryFar)
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Inactive => Severity::Muted,
            Self::VeryFar => Severity::Critical,
            Self::FarFromHome => Severity::Warning,
            Self::NearHome => Severity::Ok,
        }
    }
}

/// Finer-grained bucket shown next to the closeness bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Closeness {
    VeryNear,
    Near,
    Far,
    VeryFar,
}

impl Closeness {
    pub fn from_distance(meters: f64) -> Self {
        if meters < VERY_NEAR_METERS {
            Self::VeryNear
        } else if meters < FAR_METERS {
            Self::Near
        } else if meters < VERY_FAR_METERS {
            Self::Far
        } else {
            Self::VeryFar
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryNear => "very near",
            Self::Near => "near",
            Self::Far => "far",
            Self::VeryFar => "very far",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Muted,
    Ok,
    Warning,
    Critical,
}

impl Severity {
    /// Colour band of the closeness bar; independent of the active flag.
    pub fn for_bar(meters: f64) -> Self {
        if meters < FAR_METERS {
            Self::Ok
        } else if meters < VERY_FAR_METERS {
            Self::Warning
        } else {
            Self::Critical
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proximity {
    pub tier: Tier,
    pub closeness: Closeness,
    pub bar_severity: Severity,
    pub distance_meters: f64,
    pub percentage: f64,
}

pub fn distance_meters(home: &Coordinates, current: &Coordinates) -> Result<f64, Error> {
    let meters = home.planar_distance(current) * METERS_PER_DEGREE;

    if !meters.is_finite() {
        return Err(invalid_coordinates_error());
    }

    Ok(meters)
}

pub fn tier(meters: f64, is_active: bool) -> Tier {
    if !is_active {
        Tier::Inactive
    } else if meters > VERY_FAR_METERS {
        Tier::VeryFar
    } else if meters > FAR_METERS {
        Tier::FarFromHome
    } else {
        Tier::NearHome
    }
}

/// `clamp(100 - meters / 10, 10, 100)`
pub fn closeness_percentage(meters: f64) -> f64 {
    (100.0 - meters / 10.0).clamp(10.0, 100.0)
}

#[tracing::instrument(level = "trace")]
pub fn classify(
    home: &Coordinates,
    current: &Coordinates,
    is_active: bool,
) -> Result<Proximity, Error> {
    let meters = distance_meters(home, current)?;

    Ok(Proximity {
        tier: tier(meters, is_active),
        closeness: Closeness::from_distance(meters),
        bar_severity: Severity::for_bar(meters),
        distance_meters: meters,
        percentage: closeness_percentage(meters),
    })
}

#[test]
fn tiers_at_reference_distances() {
    assert_eq!(tier(0.0, true).label(), "Near home");
    assert_eq!(tier(250.0, true).label(), "Far from home");
    assert_eq!(tier(600.0, true).label(), "Very far");
    assert_eq!(tier(0.0, false).label(), "Inactive");
    assert_eq!(tier(600.0, false), Tier::Inactive);
    assert!(tier(600.0, true).is_alert());
}

#[test]
fn tier_thresholds_are_exclusive() {
    assert_eq!(tier(200.0, true), Tier::NearHome);
    assert_eq!(tier(500.0, true), Tier::FarFromHome);
}

#[test]
fn closeness_buckets() {
    assert_eq!(Closeness::from_distance(0.0).label(), "very near");
    assert_eq!(Closeness::from_distance(150.0).label(), "near");
    assert_eq!(Closeness::from_distance(250.0).label(), "far");
    assert_eq!(Closeness::from_distance(600.0).label(), "very far");
    assert_eq!(Closeness::from_distance(200.0), Closeness::Far);
}

#[test]
fn percentage_is_clamped() {
    assert_eq!(closeness_percentage(0.0), 100.0);
    assert_eq!(closeness_percentage(450.0), 55.0);
    assert_eq!(closeness_percentage(900.0), 10.0);
    assert_eq!(closeness_percentage(9000.0), 10.0);
}

#[test]
fn classify_converts_degrees_to_meters() {
    let home = Coordinates::new(0.0, 0.0);
    let current = Coordinates::new(0.003, 0.004);

    let proximity = classify(&home, &current, true).unwrap();

    assert!((proximity.distance_meters - 555.0).abs() < 1e-6);
    assert_eq!(proximity.tier, Tier::VeryFar);
    assert_eq!(proximity.closeness, Closeness::VeryFar);
    assert_eq!(proximity.bar_severity, Severity::Critical);
    assert_eq!(proximity.tier.severity(), Severity::Critical);
    assert!((proximity.percentage - 44.5).abs() < 1e-9);
}

#[test]
fn classify_inactive_at_home() {
    let home = Coordinates::new(-23.5505, -46.6333);

    let proximity = classify(&home, &home, false).unwrap();

    assert_eq!(proximity.tier, Tier::Inactive);
    assert_eq!(proximity.tier.severity(), Severity::Muted);
    assert_eq!(proximity.closeness, Closeness::VeryNear);
    assert_eq!(proximity.percentage, 100.0);
}

#[test]
fn classify_fails_loudly_on_non_finite_input() {
    let home = Coordinates::new(0.0, 0.0);

    for current in [
        Coordinates::new(f64::NAN, 0.0),
        Coordinates::new(0.0, f64::INFINITY),
    ] {
        let err = classify(&home, &current, true).unwrap_err();
        assert!(err.is_invalid_coordinates_error());
    }
}
