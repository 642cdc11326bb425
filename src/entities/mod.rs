mod location;
mod pet;

pub use location::Coordinates;
pub use pet::{NewPet, PathHistory, Pet, PetPatch, PATH_HISTORY_CAPACITY};

#[cfg(test)]
pub(crate) use pet::new_pet_at;
