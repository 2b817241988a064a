//! Shared setup for commands that need the control surface.

use std::path::PathBuf;
use std::sync::Arc;

use mindguard_core::{Config, ControlSurface, CoreError, KeyValueStore, SqliteKvStore};

use crate::platform::{self, HeadlessPlatform};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Open the key-value store named by `storage.database_path`, or the default.
pub fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>, CoreError> {
    let store = match &config.storage.database_path {
        Some(path) => SqliteKvStore::open_at(path)?,
        None => SqliteKvStore::open()?,
    };
    Ok(Arc::new(store))
}

/// Load config and build a control surface over the headless platform.
pub fn open_control(options: HeadlessPlatform) -> CliResult<ControlSurface> {
    let config = Config::load()?;
    let kv = open_store(&config)?;
    Ok(ControlSurface::new(&config, kv, platform::build(options))?)
}

/// Control surface without usage samples or an event feed.
pub fn open_basic() -> CliResult<ControlSurface> {
    open_control(HeadlessPlatform::default())
}

pub fn samples_platform(samples: Option<PathBuf>) -> HeadlessPlatform {
    HeadlessPlatform {
        samples,
        ..HeadlessPlatform::default()
    }
}
