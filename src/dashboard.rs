use chrono::{DateTime, Utc};
use geo_types::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::entities::Pet;
use crate::error::Error;
use crate::proximity::{self, Severity};

/// Map polyline for a pet: home, then the path history, then the current position.
/// Pets that have not moved yet have no trail.
pub fn trail(pet: &Pet) -> LineString<f64> {
    if pet.path_history.is_empty() {
        return LineString(Vec::new());
    }

    std::iter::once(&pet.home_location)
        .chain(pet.path_history.iter())
        .chain(std::iter::once(&pet.current_location))
        .map(|coordinates| Coord {
            x: coordinates.lng,
            y: coordinates.lat,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PetCard {
    pub id: String,
    pub name: String,
    pub breed: String,
    pub age: u32,
    pub photo: String,
    pub status: String,
    pub status_severity: Severity,
    pub closeness: String,
    pub closeness_severity: Severity,
    /// Active and beyond the very-far threshold.
    pub alert: bool,
    pub distance_meters: i64,
    pub percentage: f64,
    pub tracking: bool,
    pub last_update: DateTime<Utc>,
}

impl PetCard {
    pub fn from_pet(pet: &Pet) -> Result<Self, Error> {
        let proximity =
            proximity::classify(&pet.home_location, &pet.current_location, pet.is_active)?;

        Ok(Self {
            id: pet.id.clone(),
            name: pet.name.clone(),
            breed: pet.breed.clone(),
            age: pet.age,
            photo: pet.photo.clone(),
            status: proximity.tier.label().into(),
            status_severity: proximity.tier.severity(),
            closeness: proximity.closeness.label().into(),
            closeness_severity: proximity.bar_severity,
            alert: proximity.tier.is_alert(),
            distance_meters: proximity.distance_meters.round() as i64,
            percentage: proximity.percentage,
            tracking: pet.is_active,
            last_update: pet.last_update,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub active_count: usize,
    pub cards: Vec<PetCard>,
}

impl Dashboard {
    #[tracing::instrument(skip_all, fields(pets = pets.len()))]
    pub fn from_pets(pets: &[Pet]) -> Result<Self, Error> {
        let cards = pets
            .iter()
            .map(PetCard::from_pet)
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            active_count: pets.iter().filter(|pet| pet.is_active).count(),
            cards,
        })
    }

    pub fn alerts(&self) -> impl Iterator<Item = &PetCard> {
        self.cards.iter().filter(|card| card.alert)
    }
}

#[cfg(test)]
use crate::entities::{new_pet_at, Coordinates};

#[test]
fn trail_is_empty_until_the_pet_moves() {
    let pet = Pet::new(new_pet_at("Rex", Coordinates::new(0.0, 0.0))).unwrap();

    assert_eq!(trail(&pet).0.len(), 0);
}

#[test]
fn trail_runs_home_history_current() {
    let mut pet = Pet::new(new_pet_at("Rex", Coordinates::new(0.0, 0.0))).unwrap();
    pet.move_to(Coordinates::new(0.001, 0.0)).unwrap();
    pet.move_to(Coordinates::new(0.002, 0.001)).unwrap();

    let points: Vec<(f64, f64)> = trail(&pet).0.iter().map(|c| (c.y, c.x)).collect();

    assert_eq!(
        points,
        vec![(0.0, 0.0), (0.0, 0.0), (0.001, 0.0), (0.002, 0.001)]
    );
}

#[test]
fn dashboard_summarizes_pets() {
    let rex = Pet::new(new_pet_at("Rex", Coordinates::new(0.0, 0.0))).unwrap();

    let mut mia = Pet::new(new_pet_at("Mia", Coordinates::new(0.0, 0.0))).unwrap();
    mia.move_to(Coordinates::new(0.006, 0.0)).unwrap();

    let mut bob = Pet::new(new_pet_at("Bob", Coordinates::new(0.0, 0.0))).unwrap();
    bob.toggle_active();

    let dashboard = Dashboard::from_pets(&[rex, mia, bob]).unwrap();

    assert_eq!(dashboard.active_count, 2);

    let statuses: Vec<&str> = dashboard.cards.iter().map(|c| c.status.as_str()).collect();
    assert_eq!(statuses, vec!["Near home", "Very far", "Inactive"]);

    assert_eq!(dashboard.cards[1].distance_meters, 666);
    assert_eq!(dashboard.cards[1].closeness, "very far");
    assert!((dashboard.cards[1].percentage - 33.4).abs() < 1e-9);

    let alerts: Vec<&str> = dashboard.alerts().map(|c| c.name.as_str()).collect();
    assert_eq!(alerts, vec!["Mia"]);
}

#[test]
fn inactive_pets_far_from_home_are_not_alerts() {
    let mut rex = Pet::new(new_pet_at("Rex", Coordinates::new(0.0, 0.0))).unwrap();
    rex.move_to(Coordinates::new(0.01, 0.0)).unwrap();
    let mut far_but_paused = rex.clone();
    far_but_paused.toggle_active();

    let dashboard = Dashboard::from_pets(&[rex, far_but_paused]).unwrap();

    assert!(dashboard.cards[0].alert);
    assert!(!dashboard.cards[1].alert);
    assert_eq!(dashboard.cards[1].distance_meters, 1110);
    assert_eq!(dashboard.alerts().count(), 1);
}
