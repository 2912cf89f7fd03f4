//! `fecprobe.toml` configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level probe configuration: code geometry, link impairments, and the
/// receive window.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Data shares per coding group.
    #[serde(default = "ProbeConfig::default_k")]
    pub k: usize,
    /// Total shares per coding group (k data + n-k parity).
    #[serde(default = "ProbeConfig::default_n")]
    pub n: usize,
    /// Stripe length in bytes; every share occupies one stripe.
    #[serde(default = "ProbeConfig::default_share_len")]
    pub share_len: usize,
    /// Receive-side group window (ring capacity, in groups).
    #[serde(default = "ProbeConfig::default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Probability in [0, 1] that any one packet is dropped in flight.
    #[serde(default = "ProbeConfig::default_loss_rate")]
    pub loss_rate: f64,
    /// Packets are shuffled within windows of this many packets to model
    /// bounded reordering. 1 disables reordering.
    #[serde(default = "ProbeConfig::default_reorder_window")]
    pub reorder_window: usize,
    /// RNG seed for reproducible runs. Omit for a random seed.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ProbeConfig {
    fn default_k() -> usize { 8 }
    fn default_n() -> usize { 12 }
    fn default_share_len() -> usize { 1024 }
    fn default_buffer_capacity() -> usize { 16 }
    fn default_loss_rate() -> f64 { 0.05 }
    fn default_reorder_window() -> usize { 8 }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let cfg: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k < 1 || self.k > self.n || self.n > 255 {
            anyhow::bail!("invalid code geometry: k={}, n={} (need 1 <= k <= n <= 255)", self.k, self.n);
        }
        if !(0.0..=1.0).contains(&self.loss_rate) {
            anyhow::bail!("loss_rate {} out of [0, 1]", self.loss_rate);
        }
        if self.reorder_window == 0 {
            anyhow::bail!("reorder_window must be at least 1");
        }
        if self.buffer_capacity < 2 {
            anyhow::bail!("buffer_capacity must be at least 2");
        }
        Ok(())
    }

    /// Default example matching a moderately lossy link.
    pub fn default_example() -> Self {
        Self {
            k: Self::default_k(),
            n: Self::default_n(),
            share_len: Self::default_share_len(),
            buffer_capacity: Self::default_buffer_capacity(),
            loss_rate: Self::default_loss_rate(),
            reorder_window: Self::default_reorder_window(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_example_is_valid() {
        assert!(ProbeConfig::default_example().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut cfg = ProbeConfig::default_example();
        cfg.k = 0;
        assert!(cfg.validate().is_err());
        cfg.k = 13;
        cfg.n = 12;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_loss_rate() {
        let mut cfg = ProbeConfig::default_example();
        cfg.loss_rate = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_parses_partial_toml() {
        let cfg: ProbeConfig = toml::from_str("k = 4\nn = 6\n").unwrap();
        assert_eq!(cfg.k, 4);
        assert_eq!(cfg.n, 6);
        assert_eq!(cfg.share_len, 1024);
        assert!(cfg.seed.is_none());
    }
}
