//! The few fallible seams around the core: configuration loading and reference-harness
//! setup. The protocol/tick/controller path itself is infallible (`SPEC_FULL.md` §7/§10.2).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead { path: String, #[source] source: std::io::Error },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
