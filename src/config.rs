use std::env;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::ConfigArgs;
use crate::error::VenueScoutError;

// Precedence: CLI > env > file > defaults.

const ENV_PREFIX: &str = "VENUESCOUT_";

/// The API key is read from the provider's conventional variable only,
/// never from CLI flags or the config file.
const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_TOKENS_DISCOVER: u32 = 6000;
const DEFAULT_MAX_TOKENS_RESEARCH: u32 = 4000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 180;
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Resolved configuration for a VenueScout process.
///
/// Built from three layers with precedence CLI > env > file > defaults.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: String,
    pub bind_addr: SocketAddr,
    pub model: String,
    pub max_tokens_discover: u32,
    pub max_tokens_research: u32,
    /// Upper bound per API call. The browser aborts at 3 minutes, so the
    /// default matches that.
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    /// Override for the Anthropic endpoint (gateway, proxy, mock server).
    pub anthropic_base_url: Option<String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"[redacted]")
            .field("bind_addr", &self.bind_addr)
            .field("model", &self.model)
            .field("max_tokens_discover", &self.max_tokens_discover)
            .field("max_tokens_research", &self.max_tokens_research)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("log_level", &self.log_level)
            .field("log_file", &self.log_file)
            .field("anthropic_base_url", &self.anthropic_base_url)
            .finish()
    }
}

/// TOML-deserializable config file representation. All fields optional;
/// the API key is deliberately not accepted here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    bind_addr: Option<SocketAddr>,
    model: Option<String>,
    max_tokens_discover: Option<u32>,
    max_tokens_research: Option<u32>,
    request_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    anthropic_base_url: Option<String>,
}

/// Intermediate layer where every field is optional, used to merge sources.
#[derive(Debug, Default)]
struct ConfigLayer {
    bind_addr: Option<SocketAddr>,
    model: Option<String>,
    max_tokens_discover: Option<u32>,
    max_tokens_research: Option<u32>,
    request_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    anthropic_base_url: Option<String>,
}

impl AppConfig {
    /// Load configuration with precedence: CLI > env > file > defaults.
    ///
    /// `bind_addr` is the CLI override from the `serve` subcommand
    /// (`None` for `discover`, where the bind address is irrelevant).
    pub fn load(args: &ConfigArgs, bind_addr: Option<SocketAddr>) -> anyhow::Result<Self> {
        Self::load_with_env(args, bind_addr, real_env_var)
    }

    /// Sanity checks on resolved values that the type system cannot catch.
    pub fn validate(&self) -> Result<(), VenueScoutError> {
        if self.model.trim().is_empty() {
            return Err(VenueScoutError::InvalidModel);
        }
        for value in [self.max_tokens_discover, self.max_tokens_research] {
            if value == 0 {
                return Err(VenueScoutError::InvalidMaxTokens { value });
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(VenueScoutError::InvalidTimeout {
                value: self.request_timeout_secs,
            });
        }
        Ok(())
    }

    /// Internal constructor that accepts an env-var lookup function,
    /// enabling deterministic testing without process-global mutation.
    fn load_with_env(
        args: &ConfigArgs,
        bind_addr: Option<SocketAddr>,
        env_fn: fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let file_layer = match args.config.as_deref() {
            Some(path) => load_file_layer(path)?,
            None => ConfigLayer::default(),
        };
        let env_layer = load_env_layer(env_fn)?;
        let cli_layer = cli_layer_from(args, bind_addr);

        let merged = merge_layers(file_layer, env_layer, cli_layer);

        let api_key = env_fn(API_KEY_VAR).ok_or(VenueScoutError::MissingApiKey)?;

        // The bind address default is a valid literal, so parse cannot fail.
        let default_bind: SocketAddr = DEFAULT_BIND_ADDR
            .parse()
            .expect("valid literal socket address");

        Ok(AppConfig {
            api_key,
            bind_addr: merged.bind_addr.unwrap_or(default_bind),
            model: merged
                .model
                .unwrap_or_else(|| crate::anthropic::DEFAULT_MODEL.to_owned()),
            max_tokens_discover: merged
                .max_tokens_discover
                .unwrap_or(DEFAULT_MAX_TOKENS_DISCOVER),
            max_tokens_research: merged
                .max_tokens_research
                .unwrap_or(DEFAULT_MAX_TOKENS_RESEARCH),
            request_timeout_secs: merged
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: merged.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            log_level: merged.log_level,
            log_file: merged.log_file,
            anthropic_base_url: merged.anthropic_base_url,
        })
    }
}

fn load_file_layer(path: &Path) -> anyhow::Result<ConfigLayer> {
    let contents = fs::read_to_string(path).map_err(|e| VenueScoutError::ConfigFileRead {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let fc: FileConfig =
        toml::from_str(&contents).map_err(|e| VenueScoutError::ConfigFileParse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    Ok(ConfigLayer {
        bind_addr: fc.bind_addr,
        model: fc.model,
        max_tokens_discover: fc.max_tokens_discover,
        max_tokens_research: fc.max_tokens_research,
        request_timeout_secs: fc.request_timeout_secs,
        max_retries: fc.max_retries,
        log_level: fc.log_level,
        log_file: fc.log_file,
        anthropic_base_url: fc.anthropic_base_url,
    })
}

fn real_env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn prefixed(env_fn: fn(&str) -> Option<String>, suffix: &str) -> Option<String> {
    env_fn(&format!("{ENV_PREFIX}{suffix}"))
}

fn load_env_layer(env_fn: fn(&str) -> Option<String>) -> Result<ConfigLayer, VenueScoutError> {
    Ok(ConfigLayer {
        bind_addr: parse_env(env_fn, "BIND_ADDR")?,
        model: prefixed(env_fn, "MODEL"),
        max_tokens_discover: parse_env(env_fn, "MAX_TOKENS_DISCOVER")?,
        max_tokens_research: parse_env(env_fn, "MAX_TOKENS_RESEARCH")?,
        request_timeout_secs: parse_env(env_fn, "REQUEST_TIMEOUT_SECS")?,
        max_retries: parse_env(env_fn, "MAX_RETRIES")?,
        log_level: prefixed(env_fn, "LOG_LEVEL"),
        log_file: prefixed(env_fn, "LOG_FILE").map(PathBuf::from),
        anthropic_base_url: prefixed(env_fn, "ANTHROPIC_BASE_URL"),
    })
}

/// Parse a `VENUESCOUT_*` variable into any `FromStr` type, surfacing
/// the variable name in the error.
fn parse_env<T>(
    env_fn: fn(&str) -> Option<String>,
    suffix: &str,
) -> Result<Option<T>, VenueScoutError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match prefixed(env_fn, suffix) {
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|e| VenueScoutError::ConfigEnvParse {
                var: format!("{ENV_PREFIX}{suffix}"),
                detail: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn cli_layer_from(args: &ConfigArgs, bind_addr: Option<SocketAddr>) -> ConfigLayer {
    ConfigLayer {
        bind_addr,
        model: args.model.clone(),
        max_tokens_discover: None,
        max_tokens_research: None,
        request_timeout_secs: args.request_timeout_secs,
        max_retries: args.max_retries,
        log_level: args.log_level.clone(),
        log_file: args.log_file.clone(),
        anthropic_base_url: args.anthropic_base_url.clone(),
    }
}

/// Merge three layers; later arguments win field-by-field.
fn merge_layers(file: ConfigLayer, env: ConfigLayer, cli: ConfigLayer) -> ConfigLayer {
    ConfigLayer {
        bind_addr: cli.bind_addr.or(env.bind_addr).or(file.bind_addr),
        model: cli.model.or(env.model).or(file.model),
        max_tokens_discover: cli
            .max_tokens_discover
            .or(env.max_tokens_discover)
            .or(file.max_tokens_discover),
        max_tokens_research: cli
            .max_tokens_research
            .or(env.max_tokens_research)
            .or(file.max_tokens_research),
        request_timeout_secs: cli
            .request_timeout_secs
            .or(env.request_timeout_secs)
            .or(file.request_timeout_secs),
        max_retries: cli.max_retries.or(env.max_retries).or(file.max_retries),
        log_level: cli.log_level.or(env.log_level).or(file.log_level),
        log_file: cli.log_file.or(env.log_file).or(file.log_file),
        anthropic_base_url: cli
            .anthropic_base_url
            .or(env.anthropic_base_url)
            .or(file.anthropic_base_url),
    }
}
