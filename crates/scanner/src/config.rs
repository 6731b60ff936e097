use std::{env, time::Duration};

use domain::scans::{Services, MAX_PROGRESS};

use crate::errors::Error;

const DEFAULT_ENDPOINT_URL: &str = "http://localhost:3000/api/analyze-prescription";
const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 100;
const DEFAULT_PROGRESS_STEP: u8 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerConfig {
    pub endpoint_url: String,
    pub progress_interval: Duration,
    pub progress_step: u8,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            progress_interval: Duration::from_millis(DEFAULT_PROGRESS_INTERVAL_MS),
            progress_step: DEFAULT_PROGRESS_STEP,
        }
    }
}

impl ScannerConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let endpoint_url = lookup("ANALYZE_ENDPOINT_URL").unwrap_or(defaults.endpoint_url);

        let progress_interval = match lookup("PROGRESS_INTERVAL_MS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(invalid("PROGRESS_INTERVAL_MS", "expected a positive integer")),
            },
            None => defaults.progress_interval,
        };

        let progress_step = match lookup("PROGRESS_STEP") {
            Some(raw) => match raw.parse::<u8>() {
                Ok(step) if (1..=MAX_PROGRESS).contains(&step) => step,
                _ => return Err(invalid("PROGRESS_STEP", "expected an integer from 1 to 100")),
            },
            None => defaults.progress_step,
        };

        Ok(Self {
            endpoint_url,
            progress_interval,
            progress_step,
        })
    }

    pub fn services(&self) -> Services {
        Services {
            progress_step: self.progress_step,
        }
    }
}

fn invalid(key: &str, message: &str) -> Error {
    Error::Config {
        key: key.to_string(),
        message: message.to_string(),
    }
}
