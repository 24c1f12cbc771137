//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::admission::{DEFAULT_COOLDOWN, DEFAULT_SWEEP_INTERVAL};
use crate::domain::tracking::TrackingPrefix;
use crate::intake::{DEFAULT_VISION_MODEL, DEFAULT_VISION_TIMEOUT, IntakeConfig};

mod cli;

pub use cli::{CliArgs, Command, FrameFormat, GlobalOverrides, MintArgs, ScanArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "courier-intake";
const ENV_PREFIX: &str = "COURIER_INTAKE";
const DEFAULT_STATS_MAX_AGE_SECS: u64 = 300;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub admission: AdmissionSettings,
    pub vision: VisionSettings,
    pub intake: IntakeSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct AdmissionSettings {
    pub cooldown: Duration,
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct VisionSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct IntakeSettings {
    pub tracking_prefix: TrackingPrefix,
    pub record_errors: bool,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub stats_max_age_secs: u64,
}

impl Settings {
    /// State-machine tunables drawn from the admission, vision and intake sections.
    pub fn intake_config(&self) -> IntakeConfig {
        IntakeConfig {
            cooldown: self.admission.cooldown,
            vision_timeout: self.vision.timeout,
            tracking_prefix: self.intake.tracking_prefix.clone(),
            record_errors: self.intake.record_errors,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    admission: RawAdmissionSettings,
    vision: RawVisionSettings,
    intake: RawIntakeSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(endpoint) = overrides.vision_endpoint.as_ref() {
            self.vision.endpoint = Some(endpoint.clone());
        }
        if let Some(model) = overrides.vision_model.as_ref() {
            self.vision.model = Some(model.clone());
        }
        if let Some(timeout) = overrides.vision_timeout_ms {
            self.vision.timeout_ms = Some(timeout);
        }
        if let Some(cooldown) = overrides.admission_cooldown_ms {
            self.admission.cooldown_ms = Some(cooldown);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            admission,
            vision,
            intake,
            cache,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let admission = build_admission_settings(admission)?;
        let vision = build_vision_settings(vision)?;
        let intake = build_intake_settings(intake)?;
        let cache = build_cache_settings(cache);

        Ok(Self {
            logging,
            admission,
            vision,
            intake,
            cache,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_admission_settings(
    admission: RawAdmissionSettings,
) -> Result<AdmissionSettings, LoadError> {
    let cooldown_ms = admission
        .cooldown_ms
        .unwrap_or(millis(DEFAULT_COOLDOWN));
    let cooldown_ms = positive(cooldown_ms, "admission.cooldown_ms")?;

    let sweep_secs = admission
        .sweep_interval_secs
        .unwrap_or(DEFAULT_SWEEP_INTERVAL.as_secs());
    let sweep_secs = positive(sweep_secs, "admission.sweep_interval_secs")?;

    Ok(AdmissionSettings {
        cooldown: Duration::from_millis(cooldown_ms),
        sweep_interval: Duration::from_secs(sweep_secs),
    })
}

fn build_vision_settings(vision: RawVisionSettings) -> Result<VisionSettings, LoadError> {
    let endpoint = non_blank(vision.endpoint);
    let api_key = non_blank(vision.api_key);
    let model = non_blank(vision.model).unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string());

    let timeout_ms = vision
        .timeout_ms
        .unwrap_or(millis(DEFAULT_VISION_TIMEOUT));
    let timeout_ms = positive(timeout_ms, "vision.timeout_ms")?;

    Ok(VisionSettings {
        endpoint,
        api_key,
        model,
        timeout: Duration::from_millis(timeout_ms),
    })
}

fn build_intake_settings(intake: RawIntakeSettings) -> Result<IntakeSettings, LoadError> {
    let tracking_prefix = match intake.tracking_prefix {
        Some(prefix) => TrackingPrefix::parse(prefix)
            .map_err(|err| LoadError::invalid("intake.tracking_prefix", err.to_string()))?,
        None => TrackingPrefix::default(),
    };

    Ok(IntakeSettings {
        tracking_prefix,
        record_errors: intake.record_errors.unwrap_or(false),
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> CacheSettings {
    CacheSettings {
        stats_max_age_secs: cache
            .stats_max_age_secs
            .unwrap_or(DEFAULT_STATS_MAX_AGE_SECS),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAdmissionSettings {
    cooldown_ms: Option<u64>,
    sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawVisionSettings {
    endpoint: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawIntakeSettings {
    tracking_prefix: Option<String>,
    record_errors: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    stats_max_age_secs: Option<u64>,
}

fn positive(value: u64, key: &'static str) -> Result<u64, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(value)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests;
