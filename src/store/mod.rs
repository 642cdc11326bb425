mod helpers;
mod pet_api;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{api::API, entities::Pet, error::Error};

pub type Snapshot = Arc<Vec<Pet>>;

/// In-memory pet collection. Every mutation swaps in a new snapshot, so readers
/// holding an older `Snapshot` never observe a partial update.
#[derive(Debug, Default)]
pub struct PetStore {
    pets: RwLock<Snapshot>,
}

impl PetStore {
    #[tracing::instrument(name = "PetStore::new")]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active_pets(&self) -> Vec<Pet> {
        self.pets
            .read()
            .await
            .iter()
            .filter(|pet| pet.is_active)
            .cloned()
            .collect()
    }

    /// Offsets the pet's latest stored location by the given deltas. The active flag
    /// and the location are read under the write lock, so a pet deactivated or moved
    /// after the caller's snapshot is never stepped from a stale position.
    /// Returns `None` for unknown or inactive pets.
    #[tracing::instrument(skip(self))]
    pub async fn step_pet(&self, id: &str, dlat: f64, dlng: f64) -> Result<Option<Pet>, Error> {
        helpers::mutate_pet(&self.pets, id, |pet| {
            if !pet.is_active {
                return Ok(false);
            }

            let next = pet.current_location.offset(dlat, dlng);
            pet.move_to(next).map(|_| true)
        })
        .await
    }
}

impl API for PetStore {}

#[cfg(test)]
use crate::{
    api::PetAPI,
    entities::{new_pet_at, Coordinates},
};
#[cfg(test)]
use tokio_test::block_on;

#[test]
fn step_skips_pet_deactivated_after_snapshot() {
    let store = PetStore::new();
    let pet = block_on(store.add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))).unwrap();

    let snapshot = block_on(store.active_pets());
    assert_eq!(snapshot.len(), 1);

    block_on(store.toggle_active(&pet.id)).unwrap();
    let before = block_on(store.list_pets()).unwrap();

    assert_eq!(block_on(store.step_pet(&snapshot[0].id, 0.001, 0.0)).unwrap(), None);

    let after = block_on(store.list_pets()).unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(after[0].path_history.is_empty());
}

#[test]
fn step_starts_from_latest_location() {
    let store = PetStore::new();
    let pet = block_on(store.add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))).unwrap();

    let snapshot = block_on(store.active_pets());
    block_on(store.update_location(&pet.id, Coordinates::new(0.01, 0.0))).unwrap();

    let stepped = block_on(store.step_pet(&snapshot[0].id, 0.0005, 0.0005))
        .unwrap()
        .unwrap();

    assert!((stepped.current_location.lat - 0.0105).abs() < 1e-12);
    assert!((stepped.current_location.lng - 0.0005).abs() < 1e-12);
    assert_eq!(
        stepped.path_history.to_vec(),
        vec![Coordinates::new(0.0, 0.0), Coordinates::new(0.01, 0.0)]
    );
}

#[test]
fn step_unknown_pet_is_a_no_op() {
    let store = PetStore::new();

    assert_eq!(block_on(store.step_pet("missing", 0.001, 0.0)).unwrap(), None);
    assert!(block_on(store.list_pets()).unwrap().is_empty());
}
