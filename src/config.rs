//! Controller configuration and credential lookup

use std::env;
use std::fmt;

/// Environment variable holding the agent credential by default
pub const DEFAULT_API_KEY_VAR: &str = "NOVA_ACT_API_KEY";

/// Page a session opens when the caller does not name one
pub const DEFAULT_STARTING_PAGE: &str = "https://www.amazon.com";

/// Where the agent credential comes from
#[derive(Clone)]
pub enum CredentialSource {
    /// Read from this environment variable each time it is needed
    Env(String),
    /// Fixed value supplied by the embedder
    Static(Option<String>),
}

impl CredentialSource {
    /// Current credential, treating empty values as absent
    #[must_use]
    pub fn resolve(&self) -> Option<String> {
        let value = match self {
            Self::Env(var) => env::var(var).ok(),
            Self::Static(value) => value.clone(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Name of the backing environment variable, if any
    #[must_use]
    pub fn env_var(&self) -> Option<&str> {
        match self {
            Self::Env(var) => Some(var),
            Self::Static(_) => None,
        }
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env(var) => f.debug_tuple("Env").field(var).finish(),
            Self::Static(value) => f
                .debug_tuple("Static")
                .field(&value.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Configuration for [`SessionController`](crate::SessionController)
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Credential gating `start`
    pub credentials: CredentialSource,
    /// Also forward captured console output to the real streams
    pub echo_console: bool,
    /// Starting page used when a start request omits one
    pub default_starting_page: String,
    /// Headless mode used when a start request omits it
    pub default_headless: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            credentials: CredentialSource::Env(DEFAULT_API_KEY_VAR.to_string()),
            echo_console: false,
            default_starting_page: DEFAULT_STARTING_PAGE.to_string(),
            default_headless: true,
        }
    }
}

impl ControllerConfig {
    /// Configuration reading the credential from [`DEFAULT_API_KEY_VAR`]
    #[must_use]
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Read the credential from `var` instead
    #[must_use]
    pub fn with_api_key_var(mut self, var: impl Into<String>) -> Self {
        self.credentials = CredentialSource::Env(var.into());
        self
    }

    /// Use a fixed credential (`None` means no credential at all)
    #[must_use]
    pub fn with_api_key(mut self, key: Option<impl Into<String>>) -> Self {
        self.credentials = CredentialSource::Static(key.map(Into::into));
        self
    }

    /// Echo captured console output to the real streams
    #[must_use]
    pub fn with_echo_console(mut self, echo: bool) -> Self {
        self.echo_console = echo;
        self
    }

    /// The credential, if present
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        self.credentials.resolve()
    }

    /// Whether `start` would pass its credential check
    #[must_use]
    pub fn api_key_present(&self) -> bool {
        self.api_key().is_some()
    }

    /// Credential with everything but its edges hidden
    #[must_use]
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key().map(|key| mask_secret(&key))
    }
}

/// `abcd…wxyz` for secrets of 8+ characters, `****` otherwise
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
