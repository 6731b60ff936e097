use std::{env, net::SocketAddr, time::Duration};

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_ANALYSIS_DELAY_MS: u64 = 2000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub analysis_delay: Duration,
    /// Serve through the Lambda runtime instead of a TCP listener
    pub lambda: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("API_BIND_ADDR")
            .unwrap_or(DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("API_BIND_ADDR must be a socket address")?;

        let analysis_delay = match lookup("ANALYSIS_DELAY_MS") {
            Some(raw) => Duration::from_millis(
                raw.parse()
                    .with_context(|| format!("ANALYSIS_DELAY_MS is not a number: {}", raw))?,
            ),
            None => Duration::from_millis(DEFAULT_ANALYSIS_DELAY_MS),
        };

        Ok(Self {
            bind_addr,
            analysis_delay,
            lambda: lookup("AWS_LAMBDA_RUNTIME_API").is_some(),
        })
    }
}
