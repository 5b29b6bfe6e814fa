//! Recorded Demo Samples
//!
//! A fixed catalog of voice recordings and a simulated verdict for each:
//! genuine recordings score low, spoofed ones high, with a random jitter
//! inside a fixed band.

use crate::classifier::{classify, SeverityTier};
use crate::sampler::RiskSource;
use serde::{Deserialize, Serialize};

/// Width of the jitter added on top of a band's base score
const JITTER: f64 = 10.0;

/// Whether a recording is a real voice or a synthetic one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    Bonafide,
    Spoofed,
}

impl SampleKind {
    /// Lowest score a recording of this kind can get
    pub fn base_risk(&self) -> f64 {
        match self {
            SampleKind::Bonafide => 15.0,
            SampleKind::Spoofed => 85.0,
        }
    }
}

/// A recording in the demo catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DemoSample {
    pub id: &'static str,
    pub name: &'static str,
    pub path: &'static str,
    pub kind: SampleKind,
    pub description: &'static str,
}

/// Demo catalog
pub const DEMO_SAMPLES: [DemoSample; 5] = [
    DemoSample {
        id: "001",
        name: "English Voice Sample",
        path: "/demo-audio/audio_1_en.mp3",
        kind: SampleKind::Bonafide,
        description: "English voice recording",
    },
    DemoSample {
        id: "002",
        name: "Spanish Voice Sample",
        path: "/demo-audio/audio_2_es.mp3",
        kind: SampleKind::Bonafide,
        description: "Spanish voice recording",
    },
    DemoSample {
        id: "003",
        name: "French Voice Sample",
        path: "/demo-audio/audio_3_fr.mp3",
        kind: SampleKind::Bonafide,
        description: "French voice recording",
    },
    DemoSample {
        id: "004",
        name: "Malay Voice Sample",
        path: "/demo-audio/audio_4_my.mp3",
        kind: SampleKind::Bonafide,
        description: "Malay voice recording",
    },
    DemoSample {
        id: "005",
        name: "Chinese Voice Sample",
        path: "/demo-audio/audio_5_cn.mp3",
        kind: SampleKind::Bonafide,
        description: "Chinese voice recording",
    },
];

/// Look up a catalog entry by id
pub fn find_demo_sample(id: &str) -> Option<&'static DemoSample> {
    DEMO_SAMPLES.iter().find(|s| s.id == id)
}

/// Verdict for one demo recording
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleAnalysis {
    pub sample_id: &'static str,
    pub kind: SampleKind,
    pub risk_score: f64,
    pub risk_percent: u8,
    /// Floor of `100 - risk_score`
    pub authenticity_percent: u8,
    pub tier: SeverityTier,
}

/// Score a demo recording: its band's base plus up to 10 points of jitter
pub fn analyze_sample<S: RiskSource + ?Sized>(
    sample: &DemoSample,
    source: &mut S,
) -> SampleAnalysis {
    let jitter = source.next_unit() * JITTER;
    let risk_score = (sample.kind.base_risk() + jitter).clamp(0.0, 100.0);

    SampleAnalysis {
        sample_id: sample.id,
        kind: sample.kind,
        risk_score,
        risk_percent: risk_score.floor() as u8,
        authenticity_percent: (100.0 - risk_score).floor() as u8,
        tier: classify(risk_score),
    }
}
