//! Declarative table of recognised environment variables
//!
//! Each [`Variable`] names a key, when it is required, why, how its raw
//! value is typed, and where it lands in [`Config`]. The loader walks the
//! table in order; there is no other place where variables are read.

use super::env::{parse_flag, EnvSource};
use super::keys::*;
use super::schema::{Config, Environment};
use super::secret_string;
use super::{ConfigError, LoadAccumulator};

/// When a variable must be present
#[derive(Clone, Copy)]
pub enum Requirement {
    Optional,
    Required,
    /// Required when the predicate holds over the environment
    RequiredWhen(fn(&dyn EnvSource) -> bool),
}

/// How a raw value is typed and stored
#[derive(Clone, Copy)]
pub enum Assign {
    String(fn(&mut Config, String)),
    Bool(fn(&mut Config, bool)),
    Int(fn(&mut Config, i64)),
    Float(fn(&mut Config, f64)),
    /// A string restricted to a fixed set; `Err` names the expected kind
    Choice(fn(&mut Config, &str) -> Result<(), &'static str>),
}

/// Value kind of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    String,
    Bool,
    Int,
    Float,
}

/// One entry of the table
#[derive(Clone, Copy)]
pub struct Variable {
    pub key: &'static str,
    pub requirement: Requirement,
    /// Shown after the key when the variable is missing
    pub message: &'static str,
    /// Used when the variable is blank and not required
    pub default: Option<&'static str>,
    pub assign: Assign,
}

impl Variable {
    fn new(key: &'static str, assign: Assign) -> Self {
        Self {
            key,
            requirement: Requirement::Optional,
            message: "",
            default: None,
            assign,
        }
    }

    fn required(mut self, message: &'static str) -> Self {
        self.requirement = Requirement::Required;
        self.message = message;
        self
    }

    fn required_when(mut self, when: fn(&dyn EnvSource) -> bool, message: &'static str) -> Self {
        self.requirement = Requirement::RequiredWhen(when);
        self.message = message;
        self
    }

    fn or_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub fn kind(&self) -> VariableKind {
        match self.assign {
            Assign::String(_) | Assign::Choice(_) => VariableKind::String,
            Assign::Bool(_) => VariableKind::Bool,
            Assign::Int(_) => VariableKind::Int,
            Assign::Float(_) => VariableKind::Float,
        }
    }

    pub fn is_required(&self, env: &dyn EnvSource) -> bool {
        match self.requirement {
            Requirement::Optional => false,
            Requirement::Required => true,
            Requirement::RequiredWhen(when) => when(env),
        }
    }

    /// Read this variable from `env` into `config`, recording any problem
    pub fn apply(&self, env: &dyn EnvSource, config: &mut Config, acc: &mut LoadAccumulator) {
        let value = match self.requirement {
            Requirement::Required => acc.must_string(env, self.key, self.message),
            Requirement::RequiredWhen(when) => {
                let value = env.trimmed(self.key);
                acc.must_when(when(env), self.key, self.message, &value);
                value
            }
            Requirement::Optional => env.trimmed(self.key),
        };

        let value = match (value.is_empty(), self.default) {
            (true, Some(default)) => default.to_string(),
            _ => value,
        };
        if value.is_empty() {
            return;
        }

        match self.assign {
            Assign::String(assign) => assign(config, value),
            Assign::Bool(assign) => assign(config, parse_flag(&value)),
            Assign::Int(assign) => match value.parse::<i64>() {
                Ok(number) => assign(config, number),
                Err(_) => acc.push(self.invalid(value, "integer")),
            },
            Assign::Float(assign) => match value.parse::<f64>() {
                Ok(number) => assign(config, number),
                Err(_) => acc.push(self.invalid(value, "float")),
            },
            Assign::Choice(assign) => {
                if let Err(expected) = assign(config, &value) {
                    acc.push(self.invalid(value, expected));
                }
            }
        }
    }

    fn invalid(&self, value: String, expected: &'static str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.key.to_string(),
            value,
            expected,
        }
    }
}

fn driver_is_not_sqlite(env: &dyn EnvSource) -> bool {
    !env.trimmed(DB_DRIVER).eq_ignore_ascii_case("sqlite")
}

fn string(key: &'static str, assign: fn(&mut Config, String)) -> Variable {
    Variable::new(key, Assign::String(assign))
}

fn flag(key: &'static str, assign: fn(&mut Config, bool)) -> Variable {
    Variable::new(key, Assign::Bool(assign))
}

const NOT_SQLITE: &str = "required when `DB_DRIVER` is not sqlite";

/// Every recognised variable, in load order
pub fn variables() -> Vec<Variable> {
    let mut table = Vec::with_capacity(96);
    table.extend(app_variables());
    table.extend(env_encryption_variables());
    table.extend(database_variables());
    table.extend(mail_variables());
    table.extend(registration_variables());
    table.extend(store_variables());
    table.extend(stripe_variables());
    table.extend(llm_variables());
    table.extend(translation_variables());
    table
}

fn app_variables() -> Vec<Variable> {
    vec![
        string(APP_NAME, |c, v| c.app.name = v),
        string(APP_TYPE, |c, v| c.app.kind = v),
        string(APP_URL, |c, v| c.app.url = v),
        Variable::new(
            APP_ENV,
            Assign::Choice(|c, v| {
                c.app.env = v.parse::<Environment>().map_err(|_| "environment")?;
                Ok(())
            }),
        )
        .required("set the application environment (development, local, production, staging, testing)"),
        string(APP_HOST, |c, v| c.app.host = v).required("set the host the server binds to"),
        string(APP_PORT, |c, v| c.app.port = v).required("set the port the server listens on"),
        flag(APP_DEBUG, |c, v| c.app.debug = v),
    ]
}

fn env_encryption_variables() -> Vec<Variable> {
    vec![
        flag(ENVENC_USED, |c, v| c.env_encryption.used = v),
        string(ENVENC_KEY_PRIVATE, |c, v| {
            c.env_encryption.private_key = secret_string(v)
        })
        .required_when(|env| env.flag(ENVENC_USED), "required when `ENVENC_USED` is yes"),
    ]
}

fn database_variables() -> Vec<Variable> {
    vec![
        string(DB_DRIVER, |c, v| c.database.driver = v.to_lowercase())
            .required("select the database driver (e.g., sqlite, postgres)"),
        string(DB_HOST, |c, v| c.database.host = v).required_when(driver_is_not_sqlite, NOT_SQLITE),
        string(DB_PORT, |c, v| c.database.port = v).required_when(driver_is_not_sqlite, NOT_SQLITE),
        string(DB_DATABASE, |c, v| c.database.database = v).required("set the database name"),
        string(DB_USERNAME, |c, v| c.database.username = v)
            .required_when(driver_is_not_sqlite, NOT_SQLITE),
        string(DB_PASSWORD, |c, v| c.database.password = secret_string(v))
            .required_when(driver_is_not_sqlite, NOT_SQLITE),
        string(DB_SSL_MODE, |c, v| c.database.ssl_mode = v.to_lowercase()).or_default("require"),
    ]
}

fn mail_variables() -> Vec<Variable> {
    vec![
        string(MAIL_DRIVER, |c, v| c.mail.driver = v),
        string(MAIL_HOST, |c, v| c.mail.host = v),
        Variable::new(MAIL_PORT, Assign::Int(|c, v| c.mail.port = v)),
        string(MAIL_USERNAME, |c, v| c.mail.username = v),
        string(MAIL_PASSWORD, |c, v| c.mail.password = secret_string(v)),
        string(EMAIL_FROM_ADDRESS, |c, v| c.mail.from_address = v),
        string(EMAIL_FROM_NAME, |c, v| c.mail.from_name = v),
    ]
}

fn registration_variables() -> Vec<Variable> {
    vec![flag(AUTH_REGISTRATION_ENABLED, |c, v| {
        c.auth.registration_enabled = v
    })]
}

fn store_variables() -> Vec<Variable> {
    vec![
        flag(AUDIT_STORE_USED, |c, v| c.stores.audit = v),
        flag(BLOG_STORE_USED, |c, v| c.stores.blog = v),
        flag(CACHE_STORE_USED, |c, v| c.stores.cache = v),
        flag(CHAT_STORE_USED, |c, v| c.stores.chat = v),
        flag(CMS_STORE_USED, |c, v| c.stores.cms = v),
        string(CMS_STORE_TEMPLATE_ID, |c, v| c.stores.cms_template_id = v).required_when(
            |env| env.flag(CMS_STORE_USED),
            "required when `CMS_STORE_USED` is true",
        ),
        flag(CUSTOM_STORE_USED, |c, v| c.stores.custom = v),
        flag(ENTITY_STORE_USED, |c, v| c.stores.entity = v),
        flag(FEED_STORE_USED, |c, v| c.stores.feed = v),
        flag(GEO_STORE_USED, |c, v| c.stores.geo = v),
        flag(LOG_STORE_USED, |c, v| c.stores.log = v),
        flag(META_STORE_USED, |c, v| c.stores.meta = v),
        flag(SESSION_STORE_USED, |c, v| c.stores.session = v),
        flag(SETTING_STORE_USED, |c, v| c.stores.setting = v),
        flag(SHOP_STORE_USED, |c, v| c.stores.shop = v),
        flag(SQL_FILE_STORE_USED, |c, v| c.stores.sql_file = v),
        flag(STATS_STORE_USED, |c, v| c.stores.stats = v),
        flag(SUBSCRIPTION_STORE_USED, |c, v| c.stores.subscription = v),
        flag(TASK_STORE_USED, |c, v| c.stores.task = v),
        flag(USER_STORE_USED, |c, v| c.stores.user = v),
        flag(USER_STORE_USE_VAULT, |c, v| c.stores.user_store_vault_enabled = v),
        flag(VAULT_STORE_USED, |c, v| c.stores.vault = v),
        string(VAULT_STORE_KEY, |c, v| c.stores.vault_store_key = secret_string(v)).required_when(
            |env| env.flag(VAULT_STORE_USED),
            "required when `VAULT_STORE_USED` is true",
        ),
    ]
}

fn stripe_variables() -> Vec<Variable> {
    vec![
        string(STRIPE_KEY_PRIVATE, |c, v| c.stripe.private_key = secret_string(v)),
        string(STRIPE_KEY_PUBLIC, |c, v| c.stripe.public_key = v),
    ]
}

fn llm_variables() -> Vec<Variable> {
    vec![
        flag(ANTHROPIC_API_USED, |c, v| c.llm.anthropic.used = v),
        string(ANTHROPIC_API_KEY, |c, v| c.llm.anthropic.api_key = secret_string(v)).required_when(
            |env| env.flag(ANTHROPIC_API_USED),
            "required when `ANTHROPIC_API_USED` is true",
        ),
        string(ANTHROPIC_API_DEFAULT_MODEL, |c, v| c.llm.anthropic.default_model = v)
            .required_when(
                |env| env.flag(ANTHROPIC_API_USED),
                "required when `ANTHROPIC_API_USED` is true",
            ),
        flag(GEMINI_API_USED, |c, v| c.llm.gemini.used = v),
        string(GEMINI_API_KEY, |c, v| c.llm.gemini.api_key = secret_string(v)).required_when(
            |env| env.flag(GEMINI_API_USED),
            "required when `GEMINI_API_USED` is true",
        ),
        string(GEMINI_API_DEFAULT_MODEL, |c, v| c.llm.gemini.default_model = v).required_when(
            |env| env.flag(GEMINI_API_USED),
            "required when `GEMINI_API_USED` is true",
        ),
        flag(OPENAI_API_USED, |c, v| c.llm.openai.used = v),
        string(OPENAI_API_KEY, |c, v| c.llm.openai.api_key = secret_string(v)).required_when(
            |env| env.flag(OPENAI_API_USED),
            "required when `OPENAI_API_USED` is true",
        ),
        string(OPENAI_API_DEFAULT_MODEL, |c, v| c.llm.openai.default_model = v).required_when(
            |env| env.flag(OPENAI_API_USED),
            "required when `OPENAI_API_USED` is true",
        ),
        flag(OPENROUTER_API_USED, |c, v| c.llm.openrouter.used = v),
        string(OPENROUTER_API_KEY, |c, v| c.llm.openrouter.api_key = secret_string(v))
            .required_when(
                |env| env.flag(OPENROUTER_API_USED),
                "required when `OPENROUTER_API_USED` is true",
            ),
        string(OPENROUTER_API_DEFAULT_MODEL, |c, v| c.llm.openrouter.default_model = v)
            .required_when(
                |env| env.flag(OPENROUTER_API_USED),
                "required when `OPENROUTER_API_USED` is true",
            ),
        flag(VERTEX_AI_API_USED, |c, v| c.llm.vertex.used = v),
        string(VERTEX_AI_API_PROJECT_ID, |c, v| c.llm.vertex.project_id = v).required_when(
            |env| env.flag(VERTEX_AI_API_USED),
            "required when `VERTEX_AI_API_USED` is true",
        ),
        string(VERTEX_AI_API_REGION_ID, |c, v| c.llm.vertex.region_id = v).required_when(
            |env| env.flag(VERTEX_AI_API_USED),
            "required when `VERTEX_AI_API_USED` is true",
        ),
        string(VERTEX_AI_API_MODEL_ID, |c, v| c.llm.vertex.model_id = v).required_when(
            |env| env.flag(VERTEX_AI_API_USED),
            "required when `VERTEX_AI_API_USED` is true",
        ),
        string(VERTEX_AI_API_DEFAULT_MODEL, |c, v| c.llm.vertex.default_model = v)
            .required_when(
                |env| env.flag(VERTEX_AI_API_USED),
                "required when `VERTEX_AI_API_USED` is true",
            ),
    ]
}

fn translation_variables() -> Vec<Variable> {
    vec![string(TRANSLATION_LANGUAGE_DEFAULT, |c, v| {
        c.translation.default_language = v
    })
    .or_default("en")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::MapEnv;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let table = variables();
        let keys: HashSet<&str> = table.iter().map(|v| v.key).collect();
        assert_eq!(keys.len(), table.len());
    }

    #[test]
    fn test_kinds() {
        let table = variables();
        let kind_of = |key: &str| table.iter().find(|v| v.key == key).unwrap().kind();
        assert_eq!(kind_of(MAIL_PORT), VariableKind::Int);
        assert_eq!(kind_of(APP_DEBUG), VariableKind::Bool);
        assert_eq!(kind_of(APP_ENV), VariableKind::String);
        assert_eq!(kind_of(DB_HOST), VariableKind::String);
    }

    #[test]
    fn test_required_when_follows_driver() {
        let table = variables();
        let db_host = table.iter().find(|v| v.key == DB_HOST).unwrap();

        assert!(!db_host.is_required(&MapEnv::new().with(DB_DRIVER, "sqlite")));
        assert!(!db_host.is_required(&MapEnv::new().with(DB_DRIVER, "SQLite")));
        assert!(db_host.is_required(&MapEnv::new().with(DB_DRIVER, "postgres")));
    }

    #[test]
    fn test_apply_int_rejects_garbage() {
        let table = variables();
        let port = table.iter().find(|v| v.key == MAIL_PORT).unwrap();
        let mut config = Config::default();
        let mut acc = LoadAccumulator::new();

        port.apply(&MapEnv::new().with(MAIL_PORT, "587"), &mut config, &mut acc);
        assert_eq!(config.mail.port, 587);
        assert!(!acc.has_errors());

        port.apply(&MapEnv::new().with(MAIL_PORT, "abc"), &mut config, &mut acc);
        let rendered = acc.err().unwrap().to_string();
        assert!(rendered.contains("MAIL_PORT"));
        assert!(rendered.contains("integer"));
    }

    #[test]
    fn test_apply_default_for_blank_value() {
        let table = variables();
        let ssl = table.iter().find(|v| v.key == DB_SSL_MODE).unwrap();
        let mut config = Config::default();
        config.database.ssl_mode.clear();
        let mut acc = LoadAccumulator::new();

        ssl.apply(&MapEnv::new().with(DB_SSL_MODE, "  "), &mut config, &mut acc);
        assert_eq!(config.database.ssl_mode, "require");
    }

    #[test]
    fn test_apply_choice_records_invalid_environment() {
        let table = variables();
        let app_env = table.iter().find(|v| v.key == APP_ENV).unwrap();
        let mut config = Config::default();
        let mut acc = LoadAccumulator::new();

        app_env.apply(&MapEnv::new().with(APP_ENV, "qa"), &mut config, &mut acc);
        assert!(acc.err().unwrap().to_string().contains("environment"));
    }
}
