//! Environment variable names recognised by the loader

// Application
pub const APP_NAME: &str = "APP_NAME";
pub const APP_TYPE: &str = "APP_TYPE";
pub const APP_URL: &str = "APP_URL";
pub const APP_ENV: &str = "APP_ENV";
pub const APP_HOST: &str = "APP_HOST";
pub const APP_PORT: &str = "APP_PORT";
pub const APP_DEBUG: &str = "APP_DEBUG";

// Environment encryption
pub const ENVENC_USED: &str = "ENVENC_USED";
pub const ENVENC_KEY_PRIVATE: &str = "ENVENC_KEY_PRIVATE";

// Database
pub const DB_DRIVER: &str = "DB_DRIVER";
pub const DB_HOST: &str = "DB_HOST";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_DATABASE: &str = "DB_DATABASE";
pub const DB_USERNAME: &str = "DB_USERNAME";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_SSL_MODE: &str = "DB_SSL_MODE";

// Mail
pub const MAIL_DRIVER: &str = "MAIL_DRIVER";
pub const MAIL_HOST: &str = "MAIL_HOST";
pub const MAIL_PORT: &str = "MAIL_PORT";
pub const MAIL_USERNAME: &str = "MAIL_USERNAME";
pub const MAIL_PASSWORD: &str = "MAIL_PASSWORD";
pub const EMAIL_FROM_ADDRESS: &str = "EMAIL_FROM_ADDRESS";
pub const EMAIL_FROM_NAME: &str = "EMAIL_FROM_NAME";

// Registration
pub const AUTH_REGISTRATION_ENABLED: &str = "AUTH_REGISTRATION_ENABLED";

// Stores
pub const AUDIT_STORE_USED: &str = "AUDIT_STORE_USED";
pub const BLOG_STORE_USED: &str = "BLOG_STORE_USED";
pub const CACHE_STORE_USED: &str = "CACHE_STORE_USED";
pub const CHAT_STORE_USED: &str = "CHAT_STORE_USED";
pub const CMS_STORE_USED: &str = "CMS_STORE_USED";
pub const CMS_STORE_TEMPLATE_ID: &str = "CMS_STORE_TEMPLATE_ID";
pub const CUSTOM_STORE_USED: &str = "CUSTOM_STORE_USED";
pub const ENTITY_STORE_USED: &str = "ENTITY_STORE_USED";
pub const FEED_STORE_USED: &str = "FEED_STORE_USED";
pub const GEO_STORE_USED: &str = "GEO_STORE_USED";
pub const LOG_STORE_USED: &str = "LOG_STORE_USED";
pub const META_STORE_USED: &str = "META_STORE_USED";
pub const SESSION_STORE_USED: &str = "SESSION_STORE_USED";
pub const SETTING_STORE_USED: &str = "SETTING_STORE_USED";
pub const SHOP_STORE_USED: &str = "SHOP_STORE_USED";
pub const SQL_FILE_STORE_USED: &str = "SQL_FILE_STORE_USED";
pub const STATS_STORE_USED: &str = "STATS_STORE_USED";
pub const SUBSCRIPTION_STORE_USED: &str = "SUBSCRIPTION_STORE_USED";
pub const TASK_STORE_USED: &str = "TASK_STORE_USED";
pub const USER_STORE_USED: &str = "USER_STORE_USED";
pub const USER_STORE_USE_VAULT: &str = "USER_STORE_USE_VAULT";
pub const VAULT_STORE_USED: &str = "VAULT_STORE_USED";
pub const VAULT_STORE_KEY: &str = "VAULT_STORE_KEY";

// Payments
pub const STRIPE_KEY_PRIVATE: &str = "STRIPE_KEY_PRIVATE";
pub const STRIPE_KEY_PUBLIC: &str = "STRIPE_KEY_PUBLIC";

// LLM providers
pub const ANTHROPIC_API_USED: &str = "ANTHROPIC_API_USED";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_API_DEFAULT_MODEL: &str = "ANTHROPIC_API_DEFAULT_MODEL";
pub const GEMINI_API_USED: &str = "GEMINI_API_USED";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GEMINI_API_DEFAULT_MODEL: &str = "GEMINI_API_DEFAULT_MODEL";
pub const OPENAI_API_USED: &str = "OPENAI_API_USED";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_API_DEFAULT_MODEL: &str = "OPENAI_API_DEFAULT_MODEL";
pub const OPENROUTER_API_USED: &str = "OPENROUTER_API_USED";
pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const OPENROUTER_API_DEFAULT_MODEL: &str = "OPENROUTER_API_DEFAULT_MODEL";
pub const VERTEX_AI_API_USED: &str = "VERTEX_AI_API_USED";
pub const VERTEX_AI_API_PROJECT_ID: &str = "VERTEX_AI_API_PROJECT_ID";
pub const VERTEX_AI_API_REGION_ID: &str = "VERTEX_AI_API_REGION_ID";
pub const VERTEX_AI_API_MODEL_ID: &str = "VERTEX_AI_API_MODEL_ID";
pub const VERTEX_AI_API_DEFAULT_MODEL: &str = "VERTEX_AI_API_DEFAULT_MODEL";

// Translation
pub const TRANSLATION_LANGUAGE_DEFAULT: &str = "TRANSLATION_LANGUAGE_DEFAULT";
