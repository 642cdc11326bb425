use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::entities::Coordinates;
use crate::error::{invalid_input_error, Error};

pub const PATH_HISTORY_CAPACITY: usize = 10;

/// Trailing buffer of superseded locations, oldest first. Deserializing an
/// over-long sequence keeps only the most recent entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Coordinates>", into = "Vec<Coordinates>")]
pub struct PathHistory(VecDeque<Coordinates>);

impl From<Vec<Coordinates>> for PathHistory {
    fn from(entries: Vec<Coordinates>) -> Self {
        let mut history = Self::default();
        for coordinates in entries {
            history.push(coordinates);
        }

        history
    }
}

impl From<PathHistory> for Vec<Coordinates> {
    fn from(history: PathHistory) -> Self {
        history.0.into()
    }
}

impl PathHistory {
    pub fn push(&mut self, coordinates: Coordinates) {
        self.0.push_back(coordinates);

        while self.0.len() > PATH_HISTORY_CAPACITY {
            self.0.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinates> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<Coordinates> {
        self.0.iter().copied().collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub breed: String,
    pub age: u32,
    pub description: Option<String>,
    pub photo: String,
    pub home_location: Coordinates,
    pub current_location: Coordinates,
    pub path_history: PathHistory,
    pub is_active: bool,
    pub last_update: DateTime<Utc>,
}

/// Everything needed to register a pet; the id and tracking state are assigned on add.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewPet {
    pub name: String,
    pub breed: String,
    pub age: u32,
    pub description: Option<String>,
    pub photo: String,
    pub home_location: Coordinates,
    /// Defaults to the home location.
    pub current_location: Option<Coordinates>,
}

impl NewPet {
    /// Form-level check for the required fields. The store does not call this.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() || self.breed.trim().is_empty() {
            return Err(invalid_input_error());
        }

        Ok(())
    }
}

/// Field updates merged by `Pet::apply`. Identity, home and tracking fields are not patchable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PetPatch {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub age: Option<u32>,
    /// `Some(None)` clears the description; in JSON, an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    pub photo: Option<String>,
    pub is_active: Option<bool>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl Pet {
    pub fn new(data: NewPet) -> Result<Self, Error> {
        let current_location = data.current_location.unwrap_or(data.home_location);

        data.home_location.validate()?;
        current_location.validate()?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            breed: data.breed,
            age: data.age,
            description: data.description,
            photo: data.photo,
            home_location: data.home_location,
            current_location,
            path_history: PathHistory::default(),
            is_active: true,
            last_update: Utc::now(),
        })
    }

    pub fn move_to(&mut self, coordinates: Coordinates) -> Result<(), Error> {
        coordinates.validate()?;

        self.path_history.push(self.current_location);
        self.current_location = coordinates;
        self.last_update = Utc::now();

        Ok(())
    }

    pub fn toggle_active(&mut self) {
        self.is_active = !self.is_active;
        self.last_update = Utc::now();
    }

    pub fn apply(&mut self, patch: PetPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(breed) = patch.breed {
            self.breed = breed;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(photo) = patch.photo {
            self.photo = photo;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }

        self.last_update = Utc::now();
    }
}

#[cfg(test)]
pub(crate) fn new_pet_at(name: &str, home: Coordinates) -> NewPet {
    NewPet {
        name: name.into(),
        breed: "Vira-lata".into(),
        age: 3,
        description: None,
        photo: "https://example.com/pet.jpg".into(),
        home_location: home,
        current_location: None,
    }
}

#[test]
fn new_pet_starts_active_at_home() {
    let pet = Pet::new(new_pet_at("Rex", Coordinates::new(0.0, 0.0))).unwrap();

    assert!(pet.is_active);
    assert!(pet.path_history.is_empty());
    assert_eq!(pet.current_location, pet.home_location);
    assert!(Uuid::parse_str(&pet.id).is_ok());
}

#[test]
fn path_history_keeps_last_ten_in_order() {
    let mut pet = Pet::new(new_pet_at("Rex", Coordinates::new(0.0, 0.0))).unwrap();

    for i in 1..=25 {
        pet.move_to(Coordinates::new(i as f64 * 0.001, 0.0)).unwrap();
        assert!(pet.path_history.len() <= PATH_HISTORY_CAPACITY);
    }

    let expected: Vec<Coordinates> = (15..25)
        .map(|i| Coordinates::new(i as f64 * 0.001, 0.0))
        .collect();

    assert_eq!(pet.path_history.to_vec(), expected);
    assert_eq!(pet.current_location, Coordinates::new(0.025, 0.0));
}

#[test]
fn move_to_rejects_invalid_coordinates_without_mutation() {
    let mut pet = Pet::new(new_pet_at("Rex", Coordinates::new(0.0, 0.0))).unwrap();
    let before = pet.clone();

    assert!(pet.move_to(Coordinates::new(f64::NAN, 0.0)).is_err());
    assert_eq!(pet, before);
}

#[test]
fn apply_merges_only_given_fields() {
    let mut pet = Pet::new(new_pet_at("Rex", Coordinates::new(0.0, 0.0))).unwrap();
    let id = pet.id.clone();
    let before = pet.last_update;

    pet.apply(PetPatch {
        name: Some("Thor".into()),
        age: Some(4),
        ..Default::default()
    });

    assert_eq!(pet.id, id);
    assert_eq!(pet.name, "Thor");
    assert_eq!(pet.age, 4);
    assert_eq!(pet.breed, "Vira-lata");
    assert!(pet.last_update >= before);
}

#[test]
fn validate_requires_name_and_breed() {
    let mut data = new_pet_at("Rex", Coordinates::new(0.0, 0.0));
    assert!(data.validate().is_ok());

    data.breed = "  ".into();
    assert!(data.validate().unwrap_err().is_invalid_input_error());
}

#[test]
fn deserialized_history_is_trimmed_to_capacity() {
    let mut pet = Pet::new(new_pet_at("Rex", Coordinates::new(0.0, 0.0))).unwrap();
    for i in 1..=PATH_HISTORY_CAPACITY {
        pet.move_to(Coordinates::new(i as f64, 0.0)).unwrap();
    }

    let mut value = serde_json::to_value(&pet).unwrap();
    value["path_history"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({ "lat": 50.0, "lng": 0.0 }));
    assert_eq!(value["path_history"].as_array().unwrap().len(), 11);

    let restored: Pet = serde_json::from_value(value).unwrap();

    assert_eq!(restored.path_history.len(), PATH_HISTORY_CAPACITY);
    assert_eq!(
        restored.path_history.iter().next(),
        Some(&Coordinates::new(1.0, 0.0))
    );
    assert_eq!(
        restored.path_history.iter().last(),
        Some(&Coordinates::new(50.0, 0.0))
    );
}

#[test]
fn patch_can_clear_description() {
    let mut data = new_pet_at("Rex", Coordinates::new(0.0, 0.0));
    data.description = Some("Shy".into());
    let mut pet = Pet::new(data).unwrap();

    pet.apply(PetPatch::default());
    assert_eq!(pet.description.as_deref(), Some("Shy"));

    let patch: PetPatch = serde_json::from_str(r#"{ "description": null }"#).unwrap();
    assert_eq!(patch.description, Some(None));

    pet.apply(patch);
    assert_eq!(pet.description, None);

    let untouched: PetPatch = serde_json::from_str("{}").unwrap();
    assert_eq!(untouched.description, None);
}
