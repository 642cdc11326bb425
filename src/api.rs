use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{Coordinates, NewPet, Pet, PetPatch};
use crate::error::Error;

/// Mutations on an unknown id are no-ops: they return `None`/`false` and leave the
/// collection untouched.
#[async_trait]
pub trait PetAPI {
    async fn add_pet(&self, data: NewPet) -> Result<Pet, Error>;
    async fn update_location(&self, id: &str, coordinates: Coordinates)
        -> Result<Option<Pet>, Error>;
    async fn toggle_active(&self, id: &str) -> Result<Option<Pet>, Error>;
    async fn patch_pet(&self, id: &str, patch: PetPatch) -> Result<Option<Pet>, Error>;
    async fn remove_pet(&self, id: &str) -> Result<bool, Error>;
    async fn find_pet(&self, id: &str) -> Result<Option<Pet>, Error>;
    async fn list_pets(&self) -> Result<Arc<Vec<Pet>>, Error>;
}

pub trait API: PetAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
