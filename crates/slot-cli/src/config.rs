use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use slot_engine::{Containment, DstPolicy, EngineOptions, SlotExclusion};

pub const DEFAULT_DATA_PATH: &str = "slots.json";

/// Runtime settings, read from `SLOTS_*` environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub data_path: PathBuf,
    pub options: EngineOptions,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let data_path = env::var("SLOTS_DATA_PATH").unwrap_or(DEFAULT_DATA_PATH.to_string());
        let exclusion: SlotExclusion = env_or_default("SLOTS_SLOT_EXCLUSION")?;
        let containment: Containment = env_or_default("SLOTS_CONTAINMENT")?;
        let dst_policy: DstPolicy = env_or_default("SLOTS_DST_POLICY")?;

        Ok(Self {
            data_path: PathBuf::from(data_path),
            options: EngineOptions {
                exclusion,
                containment,
                dst_policy,
            },
        })
    }

    /// Replace the data path when one was given on the command line.
    pub fn with_data_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.data_path = path;
        }
        self
    }
}

fn env_or_default<T>(key: &str) -> Result<T>
where
    T: FromStr<Err = String> + Default,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|e: String| anyhow!("{}: {}", key, e)),
        _ => Ok(T::default()),
    }
}
