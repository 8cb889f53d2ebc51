//! Typed, TOML-backed configuration (`SPEC_FULL.md` §6/§10.3), following the reference
//! codebase's `toml`-driven `Config` convention.

use serde::Deserialize;
use std::fs;

use crate::error::SwarmError;
use crate::network::NodeId;

fn default_tick_dt_s() -> f64 {
    0.05
}
fn default_ack_timeout_s() -> f64 {
    1.5
}
fn default_base_tick_s() -> f64 {
    2.0
}
fn default_k_att() -> f64 {
    1.5
}
fn default_k_rep() -> f64 {
    5.0
}
fn default_d_safe() -> f64 {
    1.0
}
fn default_v_max() -> f64 {
    2.5
}
fn default_drone_mass_kg() -> f64 {
    0.029
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub tick_dt_s: f64,
    pub ack_timeout_s: f64,
    pub base_tick_s: f64,
    pub k_att: f64,
    pub k_rep: f64,
    pub d_safe: f64,
    pub v_max: f64,
    pub drone_mass_kg: f64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            tick_dt_s: default_tick_dt_s(),
            ack_timeout_s: default_ack_timeout_s(),
            base_tick_s: default_base_tick_s(),
            k_att: default_k_att(),
            k_rep: default_k_rep(),
            d_safe: default_d_safe(),
            v_max: default_v_max(),
            drone_mass_kg: default_drone_mass_kg(),
        }
    }
}

impl SwarmConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, SwarmError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &str) -> Result<Self, SwarmError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| SwarmError::ConfigRead { path: path.to_string(), source })?;
        Self::from_toml_str(&contents)
    }

    /// The per-id tick phase offset (`SPEC_FULL.md` §4.6 Staggering): `0.01 * id` seconds.
    pub fn tick_phase(id: NodeId) -> f64 {
        0.01 * f64::from(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_table() {
        let cfg = SwarmConfig::default();
        assert_eq!(cfg.tick_dt_s, 0.05);
        assert_eq!(cfg.ack_timeout_s, 1.5);
        assert_eq!(cfg.base_tick_s, 2.0);
        assert_eq!(cfg.k_att, 1.5);
        assert_eq!(cfg.k_rep, 5.0);
        assert_eq!(cfg.d_safe, 1.0);
        assert_eq!(cfg.v_max, 2.5);
        assert_eq!(cfg.drone_mass_kg, 0.029);
    }

    #[test]
    fn partial_toml_fills_in_remaining_defaults() {
        let cfg = SwarmConfig::from_toml_str("ack_timeout_s = 3.0\n").unwrap();
        assert_eq!(cfg.ack_timeout_s, 3.0);
        assert_eq!(cfg.tick_dt_s, 0.05);
    }

    #[test]
    fn tick_phase_scales_with_id() {
        assert_eq!(SwarmConfig::tick_phase(0), 0.0);
        assert_eq!(SwarmConfig::tick_phase(5), 0.05);
    }

    #[test]
    fn missing_file_surfaces_config_read_error() {
        let err = SwarmConfig::from_file("/nonexistent/path/does-not-exist.toml").unwrap_err();
        assert!(matches!(err, SwarmError::ConfigRead { .. }));
    }
}
