use std::sync::Arc;

use tokio::sync::RwLock;

use super::Snapshot;
use crate::{entities::Pet, error::Error};

pub fn position(pets: &[Pet], id: &str) -> Option<usize> {
    pets.iter().position(|pet| pet.id == id)
}

/// Applies `f` to a copy of the pet and swaps in a new snapshot holding it.
/// Unknown ids, failed mutations and closures returning `false` leave the
/// current snapshot in place.
#[tracing::instrument(skip(pets, f))]
pub async fn mutate_pet<F>(pets: &RwLock<Snapshot>, id: &str, f: F) -> Result<Option<Pet>, Error>
where
    F: FnOnce(&mut Pet) -> Result<bool, Error>,
{
    let mut guard = pets.write().await;

    let index = match position(guard.as_slice(), id) {
        Some(index) => index,
        None => {
            tracing::debug!("no pet with id {:?}, skipping", id);
            return Ok(None);
        }
    };

    let mut pet = guard[index].clone();
    if !f(&mut pet)? {
        return Ok(None);
    }

    let mut next: Vec<Pet> = guard.iter().cloned().collect();
    next[index] = pet.clone();
    *guard = Arc::new(next);

    Ok(Some(pet))
}
