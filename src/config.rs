use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{invalid_input_error, Error};
use crate::simulation::SimulationConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub session_dir: PathBuf,
    pub demo_ticks: u32,
}

impl Config {
    /// Reads `PETTRACK_*` variables, after loading a `.env` file if one exists.
    #[tracing::instrument(name = "Config::from_env")]
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(err.into()),
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<Option<String>, Error>,
    {
        let defaults = SimulationConfig::default();

        let tick_interval_ms = parse_or(
            &lookup,
            "PETTRACK_TICK_INTERVAL_MS",
            defaults.tick_interval.as_millis() as u64,
        )?;

        Ok(Self {
            simulation: SimulationConfig {
                tick_interval: Duration::from_millis(tick_interval_ms),
                step_degrees: parse_or(&lookup, "PETTRACK_STEP_DEGREES", defaults.step_degrees)?,
                alert_distance_degrees: parse_or(
                    &lookup,
                    "PETTRACK_ALERT_DISTANCE_DEGREES",
                    defaults.alert_distance_degrees,
                )?,
                alert_probability: parse_or(
                    &lookup,
                    "PETTRACK_ALERT_PROBABILITY",
                    defaults.alert_probability,
                )?,
            },
            session_dir: lookup("PETTRACK_SESSION_DIR")?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".pettrack")),
            demo_ticks: parse_or(&lookup, "PETTRACK_DEMO_TICKS", 5)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, Error>
where
    F: Fn(&str) -> Result<Option<String>, Error>,
    T: FromStr,
{
    match lookup(key)? {
        Some(raw) => raw.trim().parse().map_err(|_| {
            tracing::warn!("could not parse {}={:?}", key, raw);
            invalid_input_error()
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
fn lookup_from(
    pairs: &'static [(&'static str, &'static str)],
) -> impl Fn(&str) -> Result<Option<String>, Error> {
    move |key: &str| {
        Ok(pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string()))
    }
}

#[test]
fn defaults_when_nothing_is_set() {
    let config = Config::from_lookup(lookup_from(&[])).unwrap();

    assert_eq!(config.simulation, SimulationConfig::default());
    assert_eq!(config.session_dir, PathBuf::from(".pettrack"));
    assert_eq!(config.demo_ticks, 5);
}

#[test]
fn overrides_are_parsed() {
    let config = Config::from_lookup(lookup_from(&[
        ("PETTRACK_TICK_INTERVAL_MS", "250"),
        ("PETTRACK_ALERT_PROBABILITY", " 0.5 "),
        ("PETTRACK_SESSION_DIR", "/tmp/pets"),
        ("PETTRACK_DEMO_TICKS", "2"),
    ]))
    .unwrap();

    assert_eq!(config.simulation.tick_interval, Duration::from_millis(250));
    assert_eq!(config.simulation.alert_probability, 0.5);
    assert_eq!(config.simulation.step_degrees, 0.001);
    assert_eq!(config.session_dir, PathBuf::from("/tmp/pets"));
    assert_eq!(config.demo_ticks, 2);
}

#[test]
fn unparseable_value_is_invalid_input() {
    let err = Config::from_lookup(lookup_from(&[("PETTRACK_STEP_DEGREES", "far")])).unwrap_err();

    assert!(err.is_invalid_input_error());
}
