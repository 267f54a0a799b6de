//! Build-time compiler for `config/shake.toml`.
//!
//! The detector crate never parses TOML at runtime. Its build script calls
//! [`generate_from_path`] and includes the rendered Rust source, which
//! defines `SHAKE_DETECTOR_CONFIG` in terms of the detector's config types.

use std::{fmt, fmt::Write as _, fs, path::Path};

use serde::Deserialize;

#[derive(Debug)]
pub enum ConfigCompilerError {
    Io(String),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigCompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "io error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigCompilerError {}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ShakeConfigFile {
    pub throttle: ThrottleSection,
    pub spike: SpikeSection,
    pub gravity: GravitySection,
    pub source: SourceSection,
    pub tapp: TappSection,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThrottleSection {
    pub min_sample_interval_ms: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SpikeSection {
    pub threshold_g: f32,
    pub reset_window_ms: u64,
    pub required_spikes: u32,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GravitySection {
    pub standard: f32,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    pub rate: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TappSection {
    pub pacing_ms: u64,
}

const SAMPLE_RATES: [(&str, &str); 4] = [
    ("fastest", "SampleRate::Fastest"),
    ("game", "SampleRate::Game"),
    ("ui", "SampleRate::Ui"),
    ("normal", "SampleRate::Normal"),
];

const MAX_TAPP_PACING_MS: u64 = 60_000;

pub fn parse_config_file(path: &Path) -> Result<ShakeConfigFile, ConfigCompilerError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ConfigCompilerError::Io(format!("failed to read {}: {e}", path.display())))?;
    parse_config_str(&raw)
}

pub fn parse_config_str(raw: &str) -> Result<ShakeConfigFile, ConfigCompilerError> {
    toml::from_str(raw).map_err(|e| ConfigCompilerError::Parse(e.to_string()))
}

pub fn validate_config(config: &ShakeConfigFile) -> Result<(), ConfigCompilerError> {
    let fail = |msg: &str| -> Result<(), ConfigCompilerError> {
        Err(ConfigCompilerError::Validation(msg.to_string()))
    };

    if config.throttle.min_sample_interval_ms == 0 {
        return fail("throttle.min_sample_interval_ms must be > 0");
    }
    if !is_positive_finite(config.spike.threshold_g) {
        return fail("spike.threshold_g must be a positive finite number");
    }
    if config.spike.reset_window_ms == 0 {
        return fail("spike.reset_window_ms must be > 0");
    }
    if !(1..=u32::from(u8::MAX)).contains(&config.spike.required_spikes) {
        return fail("spike.required_spikes must be within 1..=255");
    }
    if !is_positive_finite(config.gravity.standard) {
        return fail("gravity.standard must be a positive finite number");
    }
    if sample_rate_path(&config.source.rate).is_none() {
        return fail("source.rate must be one of fastest, game, ui, normal");
    }
    if config.tapp.pacing_ms > MAX_TAPP_PACING_MS {
        return fail("tapp.pacing_ms must be <= 60000");
    }

    Ok(())
}

pub fn render_generated_config(config: &ShakeConfigFile) -> String {
    let rate = sample_rate_path(&config.source.rate).unwrap_or("SampleRate::Ui");
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "// @generated by shake_config_compiler; do not edit.");
    let _ = writeln!(
        out,
        "pub static SHAKE_DETECTOR_CONFIG: ShakeDetectorConfig = ShakeDetectorConfig {{"
    );
    let _ = writeln!(out, "    throttle: ThrottleConfig {{");
    let _ = writeln!(
        out,
        "        min_sample_interval_ms: {},",
        config.throttle.min_sample_interval_ms
    );
    let _ = writeln!(out, "    }},");
    let _ = writeln!(out, "    spike: SpikeConfig {{");
    let _ = writeln!(
        out,
        "        threshold_g: {},",
        render_f32(config.spike.threshold_g)
    );
    let _ = writeln!(
        out,
        "        reset_window_ms: {},",
        config.spike.reset_window_ms
    );
    let _ = writeln!(
        out,
        "        required_spikes: {},",
        config.spike.required_spikes
    );
    let _ = writeln!(out, "    }},");
    let _ = writeln!(
        out,
        "    standard_gravity: {},",
        render_f32(config.gravity.standard)
    );
    let _ = writeln!(out, "    sample_rate: {rate},");
    let _ = writeln!(out, "    tapp: TappConfig {{");
    let _ = writeln!(out, "        pacing_ms: {},", config.tapp.pacing_ms);
    let _ = writeln!(out, "    }},");
    let _ = writeln!(out, "}};");

    out
}

pub fn generate_from_path(path: &Path) -> Result<String, ConfigCompilerError> {
    let config = parse_config_file(path)?;
    validate_config(&config)?;
    Ok(render_generated_config(&config))
}

fn is_positive_finite(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn sample_rate_path(name: &str) -> Option<&'static str> {
    SAMPLE_RATES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, path)| *path)
}

// `{:?}` keeps a fractional part on integral values, so the literal stays a float.
fn render_f32(value: f32) -> String {
    format!("{value:?}")
}
