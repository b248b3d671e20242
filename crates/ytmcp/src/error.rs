/// Shell-level configuration failures
///
/// None of the variants carry the credential value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("YOUTUBE_API_KEY not configured")]
    MissingApiKey,

    #[error(
        "YOUTUBE_API_KEY appears to be an unexpanded placeholder (e.g. '${{YOUTUBE_API_KEY}}'). \
         Your MCP host likely does not interpolate env vars inside its config. \
         Set YOUTUBE_API_KEY in the host process environment or paste the key directly in the MCP config."
    )]
    PlaceholderApiKey,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl Error {
    /// Stable reason code for JSON-RPC error data
    pub fn reason(&self) -> &'static str {
        match self {
            Error::MissingApiKey | Error::PlaceholderApiKey => "missing_api_key",
            Error::InvalidConfig(_) => "invalid_config",
            Error::HttpClient(_) => "http_client",
        }
    }
}
