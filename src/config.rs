use crate::chat::types::Provider;

/// Default Gemini model and REST base.
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const GEMINI_DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default Perplexity model and chat-completions URL.
pub const PERPLEXITY_DEFAULT_MODEL: &str = "sonar-pro";
pub const PERPLEXITY_DEFAULT_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";

/// Credentials and routing for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl ProviderConfig {
    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    pub gemini: ProviderConfig,
    pub perplexity: ProviderConfig,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        AppConfig {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            gemini: provider_from_env("GEMINI", GEMINI_DEFAULT_MODEL, GEMINI_DEFAULT_ENDPOINT),
            perplexity: provider_from_env(
                "PERPLEXITY",
                PERPLEXITY_DEFAULT_MODEL,
                PERPLEXITY_DEFAULT_ENDPOINT,
            ),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Backend settings for a provider.
    pub fn provider_config(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Gemini => &self.gemini,
            Provider::Perplexity => &self.perplexity,
        }
    }

    /// Mutable backend settings, mostly useful when wiring tests.
    pub fn provider_config_mut(&mut self, provider: Provider) -> &mut ProviderConfig {
        match provider {
            Provider::Gemini => &mut self.gemini,
            Provider::Perplexity => &mut self.perplexity,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 5000,
            host: "0.0.0.0".to_string(),
            gemini: ProviderConfig {
                api_key: String::new(),
                model: GEMINI_DEFAULT_MODEL.to_string(),
                endpoint: GEMINI_DEFAULT_ENDPOINT.to_string(),
            },
            perplexity: ProviderConfig {
                api_key: String::new(),
                model: PERPLEXITY_DEFAULT_MODEL.to_string(),
                endpoint: PERPLEXITY_DEFAULT_ENDPOINT.to_string(),
            },
        }
    }
}

fn provider_from_env(prefix: &str, model: &str, endpoint: &str) -> ProviderConfig {
    let var = |suffix: &str| {
        std::env::var(format!("{prefix}_{suffix}"))
            .ok()
            .filter(|v| !v.trim().is_empty())
    };
    ProviderConfig {
        api_key: var("API_KEY").unwrap_or_default(),
        model: var("MODEL").unwrap_or_else(|| model.to_string()),
        endpoint: var("ENDPOINT").unwrap_or_else(|| endpoint.to_string()),
    }
}
