use std::sync::Arc;

use pettrack::api::{DynAPI, PetAPI};
use pettrack::dashboard::Dashboard;
use pettrack::entities::{Coordinates, NewPet, PetPatch};
use pettrack::proximity::Tier;
use pettrack::store::PetStore;
use tokio_test::block_on;

fn new_pet(name: &str) -> NewPet {
    NewPet {
        name: name.into(),
        breed: "Beagle".into(),
        age: 5,
        description: Some("Escapes through the fence".into()),
        photo: "https://example.com/beagle.jpg".into(),
        home_location: Coordinates::new(0.0, 0.0),
        current_location: None,
    }
}

#[test]
fn pet_wanders_away_and_dashboard_follows() {
    let api: DynAPI = Arc::new(PetStore::new());

    let pet = block_on(api.add_pet(new_pet("Snoopy"))).unwrap();

    for step in 1..=12 {
        block_on(api.update_location(&pet.id, Coordinates::new(step as f64 * 0.0005, 0.0)))
            .unwrap()
            .unwrap();
    }

    let pets = block_on(api.list_pets()).unwrap();
    assert_eq!(pets[0].path_history.len(), 10);
    assert_eq!(pets[0].path_history.to_vec()[0], Coordinates::new(0.001, 0.0));

    let dashboard = Dashboard::from_pets(&pets).unwrap();
    assert_eq!(dashboard.cards[0].status, Tier::VeryFar.label());
    assert_eq!(dashboard.cards[0].distance_meters, 666);

    block_on(api.patch_pet(
        &pet.id,
        PetPatch {
            is_active: Some(false),
            ..Default::default()
        },
    ))
    .unwrap();

    let pets = block_on(api.list_pets()).unwrap();
    let dashboard = Dashboard::from_pets(&pets).unwrap();
    assert_eq!(dashboard.active_count, 0);
    assert_eq!(dashboard.cards[0].status, "Inactive");

    assert!(block_on(api.remove_pet(&pet.id)).unwrap());
    assert!(block_on(api.list_pets()).unwrap().is_empty());
}
