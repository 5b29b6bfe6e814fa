//! Signal Sampler
//!
//! Random-walk risk drift with decaying voice confidence. Every step is
//! bounded, so the stream stays inside its configured envelope no matter
//! what the random source yields.

use crate::{RiskSample, SignalError};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Source of unit-interval draws driving the sampler
pub trait RiskSource: Send {
    /// Next draw in `[0, 1)`
    fn next_unit(&mut self) -> f64;
}

/// Pseudo-random source backed by `StdRng`
pub struct RngSource {
    rng: StdRng,
}

impl RngSource {
    /// Seed from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed seed, reproducible across runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RiskSource for RngSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted
pub struct ScriptedSource {
    draws: Vec<f64>,
    position: usize,
}

impl ScriptedSource {
    /// Create a scripted source. An empty script always yields 0.
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, position: 0 }
    }
}

impl RiskSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let draw = self.draws[self.position % self.draws.len()];
        self.position = (self.position + 1) % self.draws.len();
        // out-of-range script entries must not break the envelope
        if draw.is_finite() {
            draw.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl<S: RiskSource + ?Sized> RiskSource for Box<S> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Maximum risk increase per tick (default: 5.0)
    pub max_rise_per_tick: f64,
    /// Maximum confidence decrease per tick (default: 10.0)
    pub max_decay_per_tick: f64,
    /// Risk never exceeds this (default: 95.0)
    pub risk_ceiling: f64,
    /// Confidence never drops below this (default: 20.0)
    pub confidence_floor: f64,
    /// Confidence never exceeds this (default: 100.0)
    pub confidence_ceiling: f64,
    /// Risk score at call start
    pub initial_risk: f64,
    /// Voice confidence at call start
    pub initial_confidence: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_rise_per_tick: 5.0,
            max_decay_per_tick: 10.0,
            risk_ceiling: 95.0,
            confidence_floor: 20.0,
            confidence_ceiling: 100.0,
            initial_risk: 15.0,
            initial_confidence: 87.0,
        }
    }
}

impl SamplerConfig {
    /// Check that every bound is on the 0-100 scale and correctly ordered
    pub fn validate(&self) -> Result<(), SignalError> {
        for (field, value) in [
            ("max_rise_per_tick", self.max_rise_per_tick),
            ("max_decay_per_tick", self.max_decay_per_tick),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SignalError::InvalidStep { field, value });
            }
        }

        for (field, value) in [
            ("risk_ceiling", self.risk_ceiling),
            ("confidence_floor", self.confidence_floor),
            ("confidence_ceiling", self.confidence_ceiling),
            ("initial_risk", self.initial_risk),
            ("initial_confidence", self.initial_confidence),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(SignalError::OutOfScale { field, value });
            }
        }

        if self.confidence_floor > self.confidence_ceiling {
            return Err(SignalError::InvertedBounds {
                field: "confidence",
                min: self.confidence_floor,
                max: self.confidence_ceiling,
            });
        }

        Ok(())
    }

    /// Opening sample for a fresh call
    pub fn initial_sample(&self, at: DateTime<Utc>) -> RiskSample {
        RiskSample::new(
            at,
            self.initial_risk.clamp(0.0, self.risk_ceiling),
            self.initial_confidence
                .clamp(self.confidence_floor, self.confidence_ceiling),
        )
    }
}

/// Produces the next risk observation from the previous one
pub struct SignalSampler<S: RiskSource> {
    config: SamplerConfig,
    source: S,
}

impl<S: RiskSource> SignalSampler<S> {
    /// Create a sampler over the given random source
    pub fn new(config: SamplerConfig, source: S) -> Self {
        info!(
            "Creating signal sampler (rise <= {}, decay <= {})",
            config.max_rise_per_tick, config.max_decay_per_tick
        );
        Self { config, source }
    }

    /// Advance one tick from `previous`
    pub fn sample(&mut self, previous: &RiskSample, elapsed: Duration) -> RiskSample {
        let drift = self.source.next_unit() * self.config.max_rise_per_tick;
        let decay = self.source.next_unit() * self.config.max_decay_per_tick;

        let risk_score = clamp_score(previous.risk_score + drift, 0.0, self.config.risk_ceiling);
        let confidence = clamp_score(
            previous.confidence - decay,
            self.config.confidence_floor,
            self.config.confidence_ceiling,
        );

        let timestamp = chrono::Duration::from_std(elapsed)
            .ok()
            .and_then(|step| previous.timestamp.checked_add_signed(step))
            .unwrap_or(previous.timestamp);

        debug!(
            "Sampled risk {:.1} -> {:.1}, confidence {:.1} -> {:.1}",
            previous.risk_score, risk_score, previous.confidence, confidence
        );

        RiskSample {
            timestamp,
            risk_score,
            confidence,
        }
    }

    /// Sampler configuration
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }
}

/// Clamp treating NaN as the lower bound
fn clamp_score(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
