// Copyright (c) 2024 BOURSE LABS

//! Build a settings structure from a configuration file and the environment
//!
//! ---
//! The configuration is composed of 2 parts. The first one is an optional TOML
//! file. The second one is the set of environment variables prefixed with
//! `env_prefix`, which override the file values when duplicated
//! (`BOURSE_MAX_SHARES=10` overrides `max_shares` for the prefix `BOURSE`).

use serde::de::DeserializeOwned;
use std::path::Path;

/// Merges `config_path` (if any) and the prefixed environment into a `T`
pub fn build_bourse_settings<T: DeserializeOwned>(
    config_path: Option<&Path>,
    env_prefix: &str,
) -> Result<T, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
    }
    builder
        .add_source(config::Environment::with_prefix(env_prefix).try_parsing(true))
        .build()?
        .try_deserialize()
}
