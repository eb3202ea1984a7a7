//! Service configuration read from environment variables (and `.env`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

use crate::docx::BaseFont;
use crate::engine::RenderSettings;
use crate::generators::TemplateSet;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("UTC offset of {0} hours is out of range")]
    OffsetOutOfRange(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub output_dir: PathBuf,
    pub counters_file: PathBuf,
    pub metrics_file: PathBuf,
    pub caption_limit: usize,
    pub utc_offset: FixedOffset,
    pub render: RenderSettings,
    pub templates: TemplateSet,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            output_dir: PathBuf::from("generated"),
            counters_file: PathBuf::from("counters.json"),
            metrics_file: PathBuf::from("metrics.json"),
            caption_limit: 1024,
            utc_offset: FixedOffset::east_opt(3 * 3600).unwrap_or_else(|| Utc.fix()),
            render: RenderSettings::default(),
            templates: TemplateSet::default(),
        }
    }
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let string = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = string("HOST") {
            config.host = host;
        }
        if let Some(port) = parse(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(dir) = string("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = string("COUNTERS_FILE") {
            config.counters_file = PathBuf::from(path);
        }
        if let Some(path) = string("METRICS_FILE") {
            config.metrics_file = PathBuf::from(path);
        }
        if let Some(limit) = parse(&lookup, "CAPTION_LIMIT")? {
            config.caption_limit = limit;
        }
        if let Some(hours) = parse::<i32, _>(&lookup, "UTC_OFFSET_HOURS")? {
            config.utc_offset = hours
                .checked_mul(3600)
                .and_then(FixedOffset::east_opt)
                .ok_or(ConfigError::OffsetOutOfRange(hours))?;
        }

        if let Some(max) = parse(&lookup, "MAX_ITEMS_FOR_TEMPLATE")? {
            config.render.max_items = max;
        }
        let mut font = BaseFont::default();
        if let Some(family) = string("BASE_FONT_FAMILY") {
            font.family = family;
        }
        if let Some(size) = parse::<f32, _>(&lookup, "BASE_FONT_SIZE_PT")? {
            if !(size.is_finite() && size > 0.0) {
                return Err(ConfigError::InvalidValue {
                    key: "BASE_FONT_SIZE_PT",
                    value: size.to_string(),
                });
            }
            font.size_pt = size;
        }
        config.render.base_font = font;

        let templates = &mut config.templates;
        for (key, slot) in [
            ("TEMPLATE_INVOICE_SINGLE", &mut templates.invoice_single),
            ("TEMPLATE_INVOICE_MULTI", &mut templates.invoice_multi),
            ("TEMPLATE_INVOICE_MULTI_PRO", &mut templates.invoice_multi_pro),
            ("TEMPLATE_CONTRACT", &mut templates.contract_single),
            ("TEMPLATE_CONTRACT_MULTI", &mut templates.contract_multi),
        ] {
            if let Some(path) = string(key) {
                *slot = PathBuf::from(path);
            }
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        _ => Ok(None),
    }
}
