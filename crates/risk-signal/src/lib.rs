//! Risk Signal Sampling and Classification
//!
//! Produces noisy per-tick risk observations for an active call and maps
//! them onto severity tiers for the live meter and for discrete alerts.
//! Also scores the recordings in the demo catalog.

mod classifier;
mod demo;
mod error;
mod sample;
mod sampler;

pub use classifier::{
    classify, classify_alert, classify_alert_with, classify_with, AlertSeverity,
    AlertThresholds, SeverityTier, TierThresholds,
};
pub use demo::{
    analyze_sample, find_demo_sample, DemoSample, SampleAnalysis, SampleKind, DEMO_SAMPLES,
};
pub use error::SignalError;
pub use sample::RiskSample;
pub use sampler::{RiskSource, RngSource, SamplerConfig, ScriptedSource, SignalSampler};
