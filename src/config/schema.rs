//! Configuration schema types
//!
//! [`Config`] is a plain record. The loader fills it from the environment,
//! the registry reads it, and tests may assign fields directly.

use crate::config::secret::empty_secret;
use crate::config::SecretString;
use secrecy::ExposeSecret;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Runtime environment tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    #[default]
    Development,
    Local,
    Production,
    Staging,
    Testing,
}

impl Environment {
    pub const ALL: [Environment; 5] = [
        Environment::Development,
        Environment::Local,
        Environment::Production,
        Environment::Staging,
        Environment::Testing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Local => "local",
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Testing => "testing",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str() == lowered)
            .ok_or_else(|| format!("unknown environment '{s}'"))
    }
}

/// Root configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub mail: MailConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub stripe: StripeConfig,
    pub env_encryption: EnvEncryptionConfig,
    pub stores: StoresConfig,
    pub translation: TranslationConfig,
}

impl Config {
    pub fn is_testing(&self) -> bool {
        self.app.env == Environment::Testing
    }

    pub fn is_production(&self) -> bool {
        self.app.env == Environment::Production
    }
}

/// Application identity and listener
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub name: String,
    /// Application type (`APP_TYPE`)
    pub kind: String,
    pub env: Environment,
    pub host: String,
    pub port: String,
    pub url: String,
    pub debug: bool,
}

impl AppConfig {
    /// `host:port` for the HTTP listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub driver: String,
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub password: SecretString,
    pub ssl_mode: String,
}

impl DatabaseConfig {
    pub fn is_sqlite(&self) -> bool {
        self.driver.eq_ignore_ascii_case("sqlite")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: String::new(),
            host: String::new(),
            port: String::new(),
            database: String::new(),
            username: String::new(),
            password: empty_secret(),
            ssl_mode: default_ssl_mode(),
        }
    }
}

/// Outgoing mail settings. Every field is optional.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub driver: String,
    pub host: String,
    pub port: i64,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            driver: String::new(),
            host: String::new(),
            port: 0,
            username: String::new(),
            password: empty_secret(),
            from_address: String::new(),
            from_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    pub registration_enabled: bool,
}

/// A hosted LLM provider reached with an API key
#[derive(Debug, Clone)]
pub struct LlmProviderConfig {
    pub used: bool,
    pub api_key: SecretString,
    pub default_model: String,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            used: false,
            api_key: empty_secret(),
            default_model: String::new(),
        }
    }
}

/// Google Vertex AI, authenticated by the runtime service account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexConfig {
    pub used: bool,
    pub project_id: String,
    pub region_id: String,
    pub model_id: String,
    pub default_model: String,
}

#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub anthropic: LlmProviderConfig,
    pub gemini: LlmProviderConfig,
    pub openai: LlmProviderConfig,
    pub openrouter: LlmProviderConfig,
    pub vertex: VertexConfig,
}

/// Stripe keys; `used` is derived from both keys being present
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub private_key: SecretString,
    pub public_key: String,
    pub used: bool,
}

impl StripeConfig {
    pub fn keys_present(&self) -> bool {
        !self.private_key.expose_secret().is_empty() && !self.public_key.is_empty()
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            private_key: empty_secret(),
            public_key: String::new(),
            used: false,
        }
    }
}

/// Environment vault settings
#[derive(Debug, Clone)]
pub struct EnvEncryptionConfig {
    pub used: bool,
    pub private_key: SecretString,
    /// Symmetric key derived from the public/private pair
    pub derived_key: SecretString,
}

impl Default for EnvEncryptionConfig {
    fn default() -> Self {
        Self {
            used: false,
            private_key: empty_secret(),
            derived_key: empty_secret(),
        }
    }
}

/// Feature flags for the optional stores
#[derive(Debug, Clone)]
pub struct StoresConfig {
    pub audit: bool,
    pub blog: bool,
    pub cache: bool,
    pub chat: bool,
    pub cms: bool,
    pub custom: bool,
    pub entity: bool,
    pub feed: bool,
    pub geo: bool,
    pub log: bool,
    pub meta: bool,
    pub session: bool,
    pub setting: bool,
    pub shop: bool,
    pub sql_file: bool,
    pub stats: bool,
    pub subscription: bool,
    pub task: bool,
    pub user: bool,
    pub vault: bool,
    pub cms_template_id: String,
    pub vault_store_key: SecretString,
    pub user_store_vault_enabled: bool,
}

impl StoresConfig {
    /// Blind indexes exist only when both user and vault stores do
    pub fn blind_index_enabled(&self) -> bool {
        self.user && self.vault
    }

    /// Every store flag switched on
    pub fn all_enabled() -> Self {
        Self {
            audit: true,
            blog: true,
            cache: true,
            chat: true,
            cms: true,
            custom: true,
            entity: true,
            feed: true,
            geo: true,
            log: true,
            meta: true,
            session: true,
            setting: true,
            shop: true,
            sql_file: true,
            stats: true,
            subscription: true,
            task: true,
            user: true,
            vault: true,
            ..Self::default()
        }
    }
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            audit: false,
            blog: false,
            cache: false,
            chat: false,
            cms: false,
            custom: false,
            entity: false,
            feed: false,
            geo: false,
            log: false,
            meta: false,
            session: false,
            setting: false,
            shop: false,
            sql_file: false,
            stats: false,
            subscription: false,
            task: false,
            user: false,
            vault: false,
            cms_template_id: String::new(),
            vault_store_key: empty_secret(),
            user_store_vault_enabled: false,
        }
    }
}

/// Interface languages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationConfig {
    pub default_language: String,
    /// Language code to display name
    pub languages: BTreeMap<String, String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            languages: default_languages(),
        }
    }
}

pub fn default_ssl_mode() -> String {
    "require".to_string()
}

pub fn default_language() -> String {
    "en".to_string()
}

pub fn default_languages() -> BTreeMap<String, String> {
    [("en", "English"), ("bg", "Bulgarian"), ("de", "German")]
        .into_iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
}
