use std::sync::Arc;

use pettrack::api::PetAPI;
use pettrack::auth::{FileStorage, Session};
use pettrack::config::Config;
use pettrack::dashboard::{trail, Dashboard};
use pettrack::entities::{Coordinates, NewPet};
use pettrack::error::Error;
use pettrack::simulation::Executor;
use pettrack::store::PetStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let mut session = Session::restore(FileStorage::new(&config.session_dir))?;
    if !session.is_authenticated() {
        session.login("demo@pettrack.local", "demo")?;
    }

    let store = Arc::new(PetStore::new());

    // São Paulo
    let home = Coordinates::new(-23.5505, -46.6333);

    for (name, breed, age) in [("Rex", "Labrador", 4), ("Mia", "Siamese", 2)] {
        let data = NewPet {
            name: name.into(),
            breed: breed.into(),
            age,
            description: None,
            photo: format!("https://pettrack.local/photos/{}.jpg", name.to_lowercase()),
            home_location: home,
            current_location: None,
        };
        data.validate()?;
        store.add_pet(data).await?;
    }

    let (executor, alerts) = Executor::start(store.clone(), config.simulation.clone())?;

    let run_for = config.simulation.tick_interval * config.demo_ticks;
    let alert_log = tokio::spawn(async move {
        while let Ok(alert) = alerts.recv().await {
            tracing::info!("alert: {} at {:?}", alert.pet_name, alert.location);
        }
    });

    tokio::time::sleep(run_for).await;
    executor.stop().await?;
    if let Err(err) = alert_log.await {
        tracing::warn!("alert log task failed: {}", err);
    }

    let pets = store.list_pets().await?;
    for pet in pets.iter() {
        tracing::info!("{} trail has {} points", &pet.name, trail(pet).0.len());
    }

    let dashboard = Dashboard::from_pets(&pets)?;
    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    Ok(())
}
