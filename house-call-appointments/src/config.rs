use std::env;
use std::str::FromStr;
use tracing::warn;

use crate::schedule::DEFAULT_SUGGESTIONS;

pub const DEFAULT_CATALOG_PATH: &str = "data/addresses_geocoded.csv";
pub const DEFAULT_PATIENTS: usize = 30;
pub const DEFAULT_DOCTORS: usize = 10;
pub const DEFAULT_OUTPUT_PATH: &str = "schedule.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub catalog_path: String,
    pub patient_count: usize,
    pub doctor_count: usize,
    pub suggestion_limit: usize,
    pub rng_seed: Option<u64>,
    pub output_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
            patient_count: DEFAULT_PATIENTS,
            doctor_count: DEFAULT_DOCTORS,
            suggestion_limit: DEFAULT_SUGGESTIONS,
            rng_seed: None,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or unparsable values
    /// fall back to the defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        AppConfig {
            catalog_path: lookup("HOUSE_CALL_CATALOG").unwrap_or_else(|| {
                warn!("HOUSE_CALL_CATALOG not set, using {}", DEFAULT_CATALOG_PATH);
                defaults.catalog_path
            }),
            patient_count: parsed(&lookup, "HOUSE_CALL_PATIENTS", defaults.patient_count),
            doctor_count: parsed(&lookup, "HOUSE_CALL_DOCTORS", defaults.doctor_count),
            suggestion_limit: parsed(&lookup, "HOUSE_CALL_SUGGESTIONS", defaults.suggestion_limit),
            rng_seed: lookup("HOUSE_CALL_SEED").and_then(|raw| match raw.trim().parse() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("HOUSE_CALL_SEED={} is not a number, seeding from entropy", raw);
                    None
                }
            }),
            output_path: lookup("HOUSE_CALL_OUTPUT").unwrap_or(defaults.output_path),
        }
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{}={} is invalid, using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}
