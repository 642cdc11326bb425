use async_channel::{Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::entities::Coordinates;
use crate::error::{invalid_input_error, unexpected_error, Error};
use crate::proximity;
use crate::store::PetStore;

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub tick_interval: Duration,
    /// Width of the random walk step on each axis, in degrees.
    pub step_degrees: f64,
    /// Planar degree distance from home beyond which a pet may raise an alert.
    pub alert_distance_degrees: f64,
    pub alert_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(3),
            step_degrees: 0.001,
            alert_distance_degrees: 0.005,
            alert_probability: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub pet_id: String,
    pub pet_name: String,
    pub location: Coordinates,
    pub distance_meters: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub moved: usize,
    pub skipped: usize,
    pub alerts: Vec<Alert>,
}

fn sample_binomial<R: Rng>(rng: &mut R, n: u64, p: f64) -> Result<u64, Error> {
    let bin = Binomial::new(n, p).map_err(|_| invalid_input_error())?;

    Ok(bin.sample(rng))
}

pub struct Simulation {
    store: Arc<PetStore>,
    config: SimulationConfig,
    step: Uniform<f64>,
}

impl Simulation {
    #[tracing::instrument(name = "Simulation::new", skip(store))]
    pub fn new(store: Arc<PetStore>, config: SimulationConfig) -> Result<Self, Error> {
        if !config.step_degrees.is_finite() || config.step_degrees < 0.0 {
            return Err(invalid_input_error());
        }

        if !(0.0..=1.0).contains(&config.alert_probability) {
            return Err(invalid_input_error());
        }

        if config.tick_interval.is_zero() {
            return Err(invalid_input_error());
        }

        Ok(Self {
            store,
            config,
            step: Uniform::new(-0.5, 0.5),
        })
    }

    /// Steps every pet that was active in the latest snapshot. The store re-checks the
    /// active flag and applies the step to the stored location, so pets deactivated,
    /// moved or removed while the tick is in flight are never stepped from stale state.
    #[tracing::instrument(skip(self, rng))]
    pub async fn tick<R: Rng>(&self, rng: &mut R) -> Result<TickReport, Error> {
        let steps: Vec<_> = self
            .store
            .active_pets()
            .await
            .into_iter()
            .map(|pet| {
                let dlat = self.step.sample(rng) * self.config.step_degrees;
                let dlng = self.step.sample(rng) * self.config.step_degrees;
                (pet.id, dlat, dlng)
            })
            .collect();

        let results = futures::future::join_all(
            steps
                .iter()
                .map(|(id, dlat, dlng)| self.store.step_pet(id, *dlat, *dlng)),
        )
        .await;

        let mut report = TickReport::default();

        for ((id, _, _), result) in steps.iter().zip(results) {
            let pet = match result {
                Ok(Some(pet)) => pet,
                Ok(None) => {
                    tracing::debug!("pet {:?} removed or deactivated during tick", id);
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    tracing::warn!("could not move pet {:?}: {}", id, err);
                    report.skipped += 1;
                    continue;
                }
            };

            report.moved += 1;

            let far = pet.home_location.planar_distance(&pet.current_location)
                > self.config.alert_distance_degrees;

            if far && sample_binomial(rng, 1, self.config.alert_probability)? > 0 {
                report.alerts.push(Alert {
                    distance_meters: proximity::distance_meters(
                        &pet.home_location,
                        &pet.current_location,
                    )?,
                    location: pet.current_location,
                    pet_id: pet.id,
                    pet_name: pet.name,
                });
            }
        }

        Ok(report)
    }
}

/// Owns the periodic driver task. The task ends on `stop`, and is aborted if the
/// executor is dropped first.
pub struct Executor {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Executor {
    #[tracing::instrument(name = "Executor::start", skip(store))]
    pub fn start(
        store: Arc<PetStore>,
        config: SimulationConfig,
    ) -> Result<(Self, Receiver<Alert>), Error> {
        let tick_interval = config.tick_interval;
        let simulation = Simulation::new(store, config)?;

        let (tx, rx): (Sender<Alert>, Receiver<Alert>) = async_channel::unbounded();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut interval = tokio::time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // the first tick resolves immediately; pets move one period after start
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        match simulation.tick(&mut rng).await {
                            Ok(report) => {
                                for alert in report.alerts {
                                    tracing::warn!(
                                        "{} is far from home ({:.0}m)",
                                        &alert.pet_name,
                                        alert.distance_meters
                                    );

                                    if tx.send(alert).await.is_err() {
                                        tracing::debug!("alert receiver dropped");
                                    }
                                }
                            }
                            Err(err) => tracing::warn!("simulation tick failed: {}", err),
                        }
                    }
                }
            }

            tracing::info!("simulation stopped");
        });

        Ok((
            Self {
                shutdown: Some(shutdown_tx),
                handle: Some(handle),
            },
            rx,
        ))
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub async fn stop(mut self) -> Result<(), Error> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(handle) = self.handle.take() {
            handle.await.map_err(|_| unexpected_error())?;
        }

        Ok(())
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
use crate::{api::PetAPI, entities::new_pet_at};
#[cfg(test)]
use tokio_test::block_on;

#[cfg(test)]
fn store_with_two_pets() -> (Arc<PetStore>, String, String) {
    let store = Arc::new(PetStore::new());
    let home = Coordinates::new(-23.5505, -46.6333);

    let rex = block_on(store.add_pet(new_pet_at("Rex", home))).unwrap();
    let mia = block_on(store.add_pet(new_pet_at("Mia", home))).unwrap();

    (store, rex.id, mia.id)
}

#[test]
fn tick_moves_only_active_pets_within_one_step() {
    let (store, rex, mia) = store_with_two_pets();
    block_on(store.toggle_active(&mia)).unwrap();

    let simulation = Simulation::new(store.clone(), SimulationConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    let report = block_on(simulation.tick(&mut rng)).unwrap();
    assert_eq!(report.moved, 1);
    assert_eq!(report.skipped, 0);

    let rex = block_on(store.find_pet(&rex)).unwrap().unwrap();
    assert_eq!(rex.path_history.to_vec(), vec![rex.home_location]);
    assert!((rex.current_location.lat - rex.home_location.lat).abs() <= 0.00051);
    assert!((rex.current_location.lng - rex.home_location.lng).abs() <= 0.00051);

    let mia = block_on(store.find_pet(&mia)).unwrap().unwrap();
    assert!(mia.path_history.is_empty());
    assert_eq!(mia.current_location, mia.home_location);
}

#[test]
fn repeated_ticks_keep_history_bounded() {
    let (store, rex, _) = store_with_two_pets();
    let simulation = Simulation::new(store.clone(), SimulationConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..30 {
        block_on(simulation.tick(&mut rng)).unwrap();
    }

    let rex = block_on(store.find_pet(&rex)).unwrap().unwrap();
    assert_eq!(rex.path_history.len(), crate::entities::PATH_HISTORY_CAPACITY);
}

#[test]
fn alerts_follow_distance_and_probability() {
    let (store, _, _) = store_with_two_pets();
    let mut rng = StdRng::seed_from_u64(3);

    let always = SimulationConfig {
        alert_distance_degrees: 0.0,
        alert_probability: 1.0,
        ..SimulationConfig::default()
    };
    let report = block_on(Simulation::new(store.clone(), always).unwrap().tick(&mut rng)).unwrap();
    assert_eq!(report.alerts.len(), 2);
    assert!(report.alerts.iter().all(|alert| alert.distance_meters >= 0.0));

    let never = SimulationConfig {
        alert_distance_degrees: 0.0,
        alert_probability: 0.0,
        ..SimulationConfig::default()
    };
    let report = block_on(Simulation::new(store.clone(), never).unwrap().tick(&mut rng)).unwrap();
    assert!(report.alerts.is_empty());

    let out_of_reach = SimulationConfig {
        alert_distance_degrees: 1.0,
        alert_probability: 1.0,
        ..SimulationConfig::default()
    };
    let report =
        block_on(Simulation::new(store, out_of_reach).unwrap().tick(&mut rng)).unwrap();
    assert!(report.alerts.is_empty());
}

#[test]
fn new_rejects_bad_config() {
    let store = Arc::new(PetStore::new());

    let bad_probability = SimulationConfig {
        alert_probability: 1.5,
        ..SimulationConfig::default()
    };
    assert!(Simulation::new(store.clone(), bad_probability).is_err());

    let bad_interval = SimulationConfig {
        tick_interval: Duration::ZERO,
        ..SimulationConfig::default()
    };
    assert!(Simulation::new(store, bad_interval).is_err());
}

#[tokio::test]
async fn executor_ticks_until_stopped() {
    let store = Arc::new(PetStore::new());
    store
        .add_pet(new_pet_at("Rex", Coordinates::new(0.0, 0.0)))
        .await
        .unwrap();

    let config = SimulationConfig {
        tick_interval: Duration::from_millis(10),
        alert_distance_degrees: 0.0,
        alert_probability: 1.0,
        ..SimulationConfig::default()
    };

    let (executor, alerts) = Executor::start(store.clone(), config).unwrap();
    assert!(executor.is_running());

    let alert = tokio::time::timeout(Duration::from_secs(2), alerts.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alert.pet_name, "Rex");

    executor.stop().await.unwrap();

    let after_stop = store.list_pets().await.unwrap();
    assert!(!after_stop[0].path_history.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(Arc::ptr_eq(&after_stop, &store.list_pets().await.unwrap()));
    while alerts.try_recv().is_ok() {}
    assert!(alerts.is_closed());
}
