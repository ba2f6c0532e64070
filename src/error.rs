use std::path::PathBuf;

const API_KEYS_URL: &str = "https://console.anthropic.com/settings/keys";

/// Application-level errors: configuration, validation, startup.
///
/// The Anthropic client and the block parser carry their own error types
/// ([`crate::anthropic::AnthropicError`], [`crate::parse::ParseError`]);
/// this enum covers everything that can go wrong before a request is made.
#[derive(Debug, thiserror::Error)]
pub enum VenueScoutError {
    #[error(
        "ANTHROPIC_API_KEY environment variable is not set. \
         Create a key at {API_KEYS_URL}"
    )]
    MissingApiKey,

    #[error("Failed to read config file {path}: {detail}")]
    ConfigFileRead { path: PathBuf, detail: String },

    #[error("Failed to parse config file {path}: {detail}")]
    ConfigFileParse { path: PathBuf, detail: String },

    #[error("Failed to parse environment variable '{var}': {detail}")]
    ConfigEnvParse { var: String, detail: String },

    #[error("Required field '{field}' is blank")]
    BlankField { field: &'static str },

    #[error("Invalid model name: must be non-empty")]
    InvalidModel,

    #[error("Invalid max_tokens value {value}: must be greater than zero")]
    InvalidMaxTokens { value: u32 },

    #[error("Invalid request_timeout_secs value {value}: must be greater than zero")]
    InvalidTimeout { value: u64 },
}
