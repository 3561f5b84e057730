//! Process configuration, read once at startup from the environment.
//!
//! Every knob has a default except the generation API key. `.env` files are
//! honoured in debug builds (see `main.rs`).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 5000;

const GENERATION_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MODEL_CHAIN: &str = "gemini-1.5-flash,gemini-2.0-flash-001";
const GENERATION_TIMEOUT_SECS: u64 = 25;
const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_OUTPUT_TOKENS: u32 = 8192;

const GEOCODER_URL: &str =
    "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer/findAddressCandidates";
const IMAGE_SEARCH_URL: &str = "https://en.wikipedia.org/w/api.php";
const PLACEHOLDER_BASE_URL: &str = "https://loremflickr.com/800/600";

const IMAGE_TIMEOUT_MS: u64 = 3000;
const GEOCODE_TIMEOUT_MS: u64 = 3000;
const ENRICH_CONCURRENCY: usize = 3;
const ENRICH_BUDGET_SECS: u64 = 20;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("MODEL_CHAIN must list at least one model")]
    EmptyModelChain,

    #[error("ENRICH_CONCURRENCY must be at least 1")]
    ZeroConcurrency,
}

/// Options sent with every generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Ask the provider for a JSON-typed payload where it supports one.
    pub json_mode: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: GENERATION_TEMPERATURE,
            max_output_tokens: GENERATION_MAX_OUTPUT_TOKENS,
            json_mode: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_base: String,
    pub api_key: String,
    /// Tried strictly in this order.
    pub models: Vec<String>,
    pub timeout: Duration,
    pub options: GenerationOptions,
}

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub geocoder_url: String,
    pub image_search_url: String,
    pub placeholder_base_url: String,
    pub image_timeout: Duration,
    pub geocode_timeout: Duration,
    pub concurrency: usize,
    pub budget: Duration,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            geocoder_url: GEOCODER_URL.to_string(),
            image_search_url: IMAGE_SEARCH_URL.to_string(),
            placeholder_base_url: PLACEHOLDER_BASE_URL.to_string(),
            image_timeout: Duration::from_millis(IMAGE_TIMEOUT_MS),
            geocode_timeout: Duration::from_millis(GEOCODE_TIMEOUT_MS),
            concurrency: ENRICH_CONCURRENCY,
            budget: Duration::from_secs(ENRICH_BUDGET_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            CorsOrigins::Any
        } else {
            CorsOrigins::List(origins)
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub generation: GenerationConfig,
    pub enrichment: EnrichmentConfig,
    pub allowed_origins: CorsOrigins,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("GOOGLE_API_KEY"))?;

        let models = parse_model_chain(&var_or("MODEL_CHAIN", MODEL_CHAIN));
        if models.is_empty() {
            return Err(ConfigError::EmptyModelChain);
        }

        let generation = GenerationConfig {
            api_base: var_or("GENERATION_API_BASE", GENERATION_API_BASE),
            api_key,
            models,
            timeout: Duration::from_secs(parse_var(
                "GENERATION_TIMEOUT_SECS",
                GENERATION_TIMEOUT_SECS,
            )?),
            options: GenerationOptions {
                temperature: parse_var("GENERATION_TEMPERATURE", GENERATION_TEMPERATURE)?,
                max_output_tokens: parse_var(
                    "GENERATION_MAX_OUTPUT_TOKENS",
                    GENERATION_MAX_OUTPUT_TOKENS,
                )?,
                json_mode: parse_var("GENERATION_JSON_MODE", true)?,
            },
        };

        let concurrency: usize = parse_var("ENRICH_CONCURRENCY", ENRICH_CONCURRENCY)?;
        if concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        let enrichment = EnrichmentConfig {
            geocoder_url: var_or("GEOCODER_URL", GEOCODER_URL),
            image_search_url: var_or("IMAGE_SEARCH_URL", IMAGE_SEARCH_URL),
            placeholder_base_url: var_or("PLACEHOLDER_BASE_URL", PLACEHOLDER_BASE_URL),
            image_timeout: Duration::from_millis(parse_var("IMAGE_TIMEOUT_MS", IMAGE_TIMEOUT_MS)?),
            geocode_timeout: Duration::from_millis(parse_var(
                "GEOCODE_TIMEOUT_MS",
                GEOCODE_TIMEOUT_MS,
            )?),
            concurrency,
            budget: Duration::from_secs(parse_var("ENRICH_BUDGET_SECS", ENRICH_BUDGET_SECS)?),
        };

        Ok(Self {
            host: var_or("HOST", HOST),
            port: parse_var("PORT", PORT)?,
            generation,
            enrichment,
            allowed_origins: CorsOrigins::parse(&var_or("ALLOWED_ORIGINS", "*")),
        })
    }

    /// Upper bound on time spent inside one `/generate` call.
    pub fn worst_case_latency(&self) -> Duration {
        self.generation.timeout * self.generation.models.len() as u32 + self.enrichment.budget
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
        _ => Ok(default),
    }
}

fn parse_model_chain(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
