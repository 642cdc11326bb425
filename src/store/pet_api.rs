use super::helpers::{mutate_pet, position};
use super::PetStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    api::PetAPI,
    entities::{Coordinates, NewPet, Pet, PetPatch},
    error::Error,
};

#[async_trait]
impl PetAPI for PetStore {
    #[tracing::instrument(skip(self, data), fields(name = %data.name))]
    async fn add_pet(&self, data: NewPet) -> Result<Pet, Error> {
        let pet = Pet::new(data)?;

        let mut guard = self.pets.write().await;
        let mut next: Vec<Pet> = guard.iter().cloned().collect();
        next.push(pet.clone());
        *guard = Arc::new(next);

        tracing::info!("added pet {:?}", &pet.id);

        Ok(pet)
    }

    #[tracing::instrument(skip(self))]
    async fn update_location(
        &self,
        id: &str,
        coordinates: Coordinates,
    ) -> Result<Option<Pet>, Error> {
        coordinates.validate()?;

        mutate_pet(&self.pets, id, |pet| pet.move_to(coordinates).map(|_| true)).await
    }

    #[tracing::instrument(skip(self))]
    async fn toggle_active(&self, id: &str) -> Result<Option<Pet>, Error> {
        mutate_pet(&self.pets, id, |pet| {
            pet.toggle_active();
            Ok(true)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn patch_pet(&self, id: &str, patch: PetPatch) -> Result<Option<Pet>, Error> {
        mutate_pet(&self.pets, id, |pet| {
            pet.apply(patch);
            Ok(true)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn remove_pet(&self, id: &str) -> Result<bool, Error> {
        let mut guard = self.pets.write().await;

        let index = match position(guard.as_slice(), id) {
            Some(index) => index,
            None => return Ok(false),
        };

        let mut next: Vec<Pet> = guard.iter().cloned().collect();
        next.remove(index);
        *guard = Arc::new(next);

        tracing::info!("removed pet {:?}", id);

        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    async fn find_pet(&self, id: &str) -> Result<Option<Pet>, Error> {
        let pets = self.pets.read().await;

        Ok(pets.iter().find(|pet| pet.id == id).cloned())
    }

    async fn list_pets(&self) -> Result<Arc<Vec<Pet>>, Error> {
        Ok(self.pets.read().await.clone())
    }
}

#[cfg(test)]
use crate::entities::new_pet_at;
#[cfg(test)]
use tokio_test::block_on;

#[test]
fn add_assigns_unique_ids_in_insertion_order() {
    let store = PetStore::new();

    let rex = block_on(store.add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))).unwrap();
    let mia = block_on(store.add_pet(new_pet_at("Mia", Coordinates::new(1.0, 1.0)))).unwrap();

    assert_ne!(rex.id, mia.id);

    let pets = block_on(store.list_pets()).unwrap();
    let names: Vec<&str> = pets.iter().map(|pet| pet.name.as_str()).collect();
    assert_eq!(names, vec!["Rex", "Mia"]);
}

#[test]
fn update_location_scenario() {
    let store = PetStore::new();
    let pet = block_on(store.add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))).unwrap();

    for lat in [0.001, 0.002, 0.003] {
        block_on(store.update_location(&pet.id, Coordinates::new(lat, 0.0))).unwrap();
    }

    let pet = block_on(store.find_pet(&pet.id)).unwrap().unwrap();

    assert_eq!(
        pet.path_history.to_vec(),
        vec![
            Coordinates::new(0.0, 0.0),
            Coordinates::new(0.001, 0.0),
            Coordinates::new(0.002, 0.0),
        ]
    );
    assert_eq!(pet.current_location, Coordinates::new(0.003, 0.0));
}

#[test]
fn update_location_keeps_other_pets_in_place() {
    let store = PetStore::new();
    let ids: Vec<String> = ["Rex", "Mia", "Bob"]
        .iter()
        .map(|name| {
            block_on(store.add_pet(new_pet_at(name, Coordinates::new(0.0, 0.0))))
                .unwrap()
                .id
        })
        .collect();

    block_on(store.update_location(&ids[1], Coordinates::new(0.5, 0.5))).unwrap();

    let pets = block_on(store.list_pets()).unwrap();
    let order: Vec<String> = pets.iter().map(|pet| pet.id.clone()).collect();
    assert_eq!(order, ids);
    assert_eq!(pets[1].current_location, Coordinates::new(0.5, 0.5));
    assert!(pets[0].path_history.is_empty());
}

#[test]
fn update_location_rejects_invalid_coordinates() {
    let store = PetStore::new();
    let pet = block_on(store.add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))).unwrap();
    let before = block_on(store.list_pets()).unwrap();

    let err = block_on(store.update_location(&pet.id, Coordinates::new(f64::NAN, 0.0))).unwrap_err();

    assert!(err.is_invalid_coordinates_error());
    assert!(Arc::ptr_eq(&before, &block_on(store.list_pets()).unwrap()));
}

#[test]
fn mutations_on_unknown_id_leave_collection_unchanged() {
    let store = PetStore::new();
    block_on(store.add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))).unwrap();

    let before = block_on(store.list_pets()).unwrap();
    let serialized = serde_json::to_string(&*before).unwrap();

    assert_eq!(
        block_on(store.update_location("missing", Coordinates::new(1.0, 1.0))).unwrap(),
        None
    );
    assert_eq!(block_on(store.toggle_active("missing")).unwrap(), None);
    assert_eq!(
        block_on(store.patch_pet(
            "missing",
            PetPatch {
                name: Some("Ghost".into()),
                ..Default::default()
            }
        ))
        .unwrap(),
        None
    );
    assert!(!block_on(store.remove_pet("missing")).unwrap());

    let after = block_on(store.list_pets()).unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(serde_json::to_string(&*after).unwrap(), serialized);
}

#[test]
fn add_then_remove_restores_collection() {
    let store = PetStore::new();
    block_on(store.add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))).unwrap();
    let before = block_on(store.list_pets()).unwrap();

    let mia = block_on(store.add_pet(new_pet_at("Mia", Coordinates::new(0.0, 0.0)))).unwrap();
    assert!(block_on(store.remove_pet(&mia.id)).unwrap());

    let after = block_on(store.list_pets()).unwrap();
    assert_eq!(*before, *after);
}

#[test]
fn toggle_flips_active_and_refreshes_timestamp() {
    let store = PetStore::new();
    let pet = block_on(store.add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))).unwrap();

    let toggled = block_on(store.toggle_active(&pet.id)).unwrap().unwrap();
    assert!(!toggled.is_active);
    assert!(toggled.last_update >= pet.last_update);
    assert!(block_on(store.active_pets()).is_empty());

    let toggled = block_on(store.toggle_active(&pet.id)).unwrap().unwrap();
    assert!(toggled.is_active);
}

#[test]
fn patch_keeps_identity_and_tracking_state() {
    let store = PetStore::new();
    let pet = block_on(store.add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))).unwrap();
    block_on(store.update_location(&pet.id, Coordinates::new(0.001, 0.0))).unwrap();

    let patched = block_on(store.patch_pet(
        &pet.id,
        PetPatch {
            description: Some(Some("Loves the park".into())),
            ..Default::default()
        },
    ))
    .unwrap()
    .unwrap();

    assert_eq!(patched.id, pet.id);
    assert_eq!(patched.description.as_deref(), Some("Loves the park"));
    assert_eq!(patched.path_history.len(), 1);
    assert_eq!(patched.home_location, pet.home_location);
}

#[test]
fn earlier_snapshots_are_not_affected_by_later_mutations() {
    let store = PetStore::new();
    let pet = block_on(store.add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))).unwrap();
    let snapshot = block_on(store.list_pets()).unwrap();

    block_on(store.update_location(&pet.id, Coordinates::new(0.002, 0.0))).unwrap();

    assert_eq!(snapshot[0].current_location, Coordinates::new(0.0, 0.0));
}

#[test]
fn identical_registrations_stay_distinct() {
    let store = PetStore::new();
    let data = new_pet_at("Rex", Coordinates::new(0.0, 0.0));

    let first = block_on(store.add_pet(data.clone())).unwrap();
    let second = block_on(store.add_pet(data)).unwrap();
    assert_ne!(first.id, second.id);

    assert!(block_on(store.remove_pet(&first.id)).unwrap());

    assert_eq!(block_on(store.find_pet(&first.id)).unwrap(), None);
    assert!(block_on(store.find_pet(&second.id)).unwrap().is_some());
    assert!(!block_on(store.remove_pet(&first.id)).unwrap());
}
