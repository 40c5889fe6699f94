use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub completion: CompletionConfig,
    pub moderation: ModerationConfig,
    pub sentiment: SentimentConfig,
    pub search: SearchConfig,
    pub directory: DirectoryConfig,
    pub automation: AutomationConfig,
    pub speech: SpeechConfig,
    pub sessions: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Text-completion capability with tool calling (OpenAI-compatible API).
#[derive(Clone, Debug)]
pub struct CompletionConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Upper bound on tool-call rounds within a single user turn.
    pub max_tool_rounds: u32,
}

#[derive(Clone, Debug)]
pub struct ModerationConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    /// Category severities at or below this value are not treated as
    /// violations, so benign messages are not over-blocked.
    pub severity_cutoff: u8,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SentimentConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

/// Document-retrieval capability used by the policy tool.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub index: String,
    pub top_k: usize,
    pub relevance_floor: f64,
}

/// HR workload directory backing the workload-metrics tool.
#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AutomationConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub escalation_webhook_url: Option<String>,
    pub poll_initial_delay_ms: u64,
    pub poll_max_delay_ms: u64,
    pub poll_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SpeechConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub voice: String,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Sessions idle longer than this are evicted lazily on next access.
    pub idle_ttl_secs: u64,
    /// Hard cap on live sessions; the longest-idle one is evicted first.
    pub max_sessions: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub completion_base_url: Option<String>,
    pub completion_api_key: Option<String>,
    pub completion_model: Option<String>,
    pub moderation_base_url: Option<String>,
    pub session_idle_ttl_secs: Option<u64>,
    pub session_max_sessions: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            database: DatabaseConfig {
                url: "sqlite://deskd.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            completion: CompletionConfig {
                base_url: "http://localhost:11434/v1".to_string(),
                api_key: None,
                model: "llama3.1".to_string(),
                temperature: 0.5,
                max_tokens: 800,
                timeout_secs: 60,
                max_tool_rounds: 8,
            },
            moderation: ModerationConfig {
                base_url: None,
                api_key: None,
                severity_cutoff: 2,
                timeout_secs: 10,
            },
            sentiment: SentimentConfig { base_url: None, api_key: None, timeout_secs: 10 },
            search: SearchConfig {
                base_url: None,
                api_key: None,
                index: "corporate-policies".to_string(),
                top_k: 3,
                relevance_floor: 0.03,
            },
            directory: DirectoryConfig { base_url: None, api_key: None, timeout_secs: 10 },
            automation: AutomationConfig {
                base_url: None,
                api_key: None,
                escalation_webhook_url: None,
                poll_initial_delay_ms: 2000,
                poll_max_delay_ms: 6000,
                poll_timeout_secs: 120,
            },
            speech: SpeechConfig { base_url: None, api_key: None, voice: "en-US-standard".to_string() },
            sessions: SessionConfig { idle_ttl_secs: 3600, max_sessions: 10_000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    database: Option<DatabasePatch>,
    completion: Option<CompletionPatch>,
    moderation: Option<ModerationPatch>,
    sentiment: Option<SentimentPatch>,
    search: Option<SearchPatch>,
    directory: Option<DirectoryPatch>,
    automation: Option<AutomationPatch>,
    speech: Option<SpeechPatch>,
    sessions: Option<SessionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompletionPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
    max_tool_rounds: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModerationPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    severity_cutoff: Option<u8>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SentimentPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    index: Option<String>,
    top_k: Option<usize>,
    relevance_floor: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectoryPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AutomationPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    escalation_webhook_url: Option<String>,
    poll_initial_delay_ms: Option<u64>,
    poll_max_delay_ms: Option<u64>,
    poll_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpeechPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    voice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionPatch {
    idle_ttl_secs: Option<u64>,
    max_sessions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Load order: built-in defaults, then the config file (if any), then
    /// `DESKD_*` environment overrides, then programmatic overrides.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => config.apply_patch(read_patch(&path)?),
            None if options.require_file => {
                let wanted =
                    options.config_path.unwrap_or_else(|| PathBuf::from("deskd.toml"));
                return Err(ConfigError::MissingConfigFile(wanted));
            }
            None => {}
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(completion) = patch.completion {
            if let Some(base_url) = completion.base_url {
                self.completion.base_url = base_url;
            }
            if let Some(api_key) = completion.api_key {
                self.completion.api_key = Some(secret_value(api_key));
            }
            if let Some(model) = completion.model {
                self.completion.model = model;
            }
            if let Some(temperature) = completion.temperature {
                self.completion.temperature = temperature;
            }
            if let Some(max_tokens) = completion.max_tokens {
                self.completion.max_tokens = max_tokens;
            }
            if let Some(timeout_secs) = completion.timeout_secs {
                self.completion.timeout_secs = timeout_secs;
            }
            if let Some(max_tool_rounds) = completion.max_tool_rounds {
                self.completion.max_tool_rounds = max_tool_rounds;
            }
        }

        if let Some(moderation) = patch.moderation {
            if let Some(base_url) = moderation.base_url {
                self.moderation.base_url = Some(base_url);
            }
            if let Some(api_key) = moderation.api_key {
                self.moderation.api_key = Some(secret_value(api_key));
            }
            if let Some(severity_cutoff) = moderation.severity_cutoff {
                self.moderation.severity_cutoff = severity_cutoff;
            }
            if let Some(timeout_secs) = moderation.timeout_secs {
                self.moderation.timeout_secs = timeout_secs;
            }
        }

        if let Some(sentiment) = patch.sentiment {
            if let Some(base_url) = sentiment.base_url {
                self.sentiment.base_url = Some(base_url);
            }
            if let Some(api_key) = sentiment.api_key {
                self.sentiment.api_key = Some(secret_value(api_key));
            }
            if let Some(timeout_secs) = sentiment.timeout_secs {
                self.sentiment.timeout_secs = timeout_secs;
            }
        }

        if let Some(search) = patch.search {
            if let Some(base_url) = search.base_url {
                self.search.base_url = Some(base_url);
            }
            if let Some(api_key) = search.api_key {
                self.search.api_key = Some(secret_value(api_key));
            }
            if let Some(index) = search.index {
                self.search.index = index;
            }
            if let Some(top_k) = search.top_k {
                self.search.top_k = top_k;
            }
            if let Some(relevance_floor) = search.relevance_floor {
                self.search.relevance_floor = relevance_floor;
            }
        }

        if let Some(directory) = patch.directory {
            if let Some(base_url) = directory.base_url {
                self.directory.base_url = Some(base_url);
            }
            if let Some(api_key) = directory.api_key {
                self.directory.api_key = Some(secret_value(api_key));
            }
            if let Some(timeout_secs) = directory.timeout_secs {
                self.directory.timeout_secs = timeout_secs;
            }
        }

        if let Some(automation) = patch.automation {
            if let Some(base_url) = automation.base_url {
                self.automation.base_url = Some(base_url);
            }
            if let Some(api_key) = automation.api_key {
                self.automation.api_key = Some(secret_value(api_key));
            }
            if let Some(escalation_webhook_url) = automation.escalation_webhook_url {
                self.automation.escalation_webhook_url = Some(escalation_webhook_url);
            }
            if let Some(poll_initial_delay_ms) = automation.poll_initial_delay_ms {
                self.automation.poll_initial_delay_ms = poll_initial_delay_ms;
            }
            if let Some(poll_max_delay_ms) = automation.poll_max_delay_ms {
                self.automation.poll_max_delay_ms = poll_max_delay_ms;
            }
            if let Some(poll_timeout_secs) = automation.poll_timeout_secs {
                self.automation.poll_timeout_secs = poll_timeout_secs;
            }
        }

        if let Some(speech) = patch.speech {
            if let Some(base_url) = speech.base_url {
                self.speech.base_url = Some(base_url);
            }
            if let Some(api_key) = speech.api_key {
                self.speech.api_key = Some(secret_value(api_key));
            }
            if let Some(voice) = speech.voice {
                self.speech.voice = voice;
            }
        }

        if let Some(sessions) = patch.sessions {
            if let Some(idle_ttl_secs) = sessions.idle_ttl_secs {
                self.sessions.idle_ttl_secs = idle_ttl_secs;
            }
            if let Some(max_sessions) = sessions.max_sessions {
                self.sessions.max_sessions = max_sessions;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DESKD_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("DESKD_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("DESKD_DATABASE_MAX_CONNECTIONS", &value)?;
        }

        if let Some(value) = read_env("DESKD_COMPLETION_BASE_URL") {
            self.completion.base_url = value;
        }
        if let Some(value) = read_env("DESKD_COMPLETION_API_KEY") {
            self.completion.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DESKD_COMPLETION_MODEL") {
            self.completion.model = value;
        }

        if let Some(value) = read_env("DESKD_MODERATION_BASE_URL") {
            self.moderation.base_url = Some(value);
        }
        if let Some(value) = read_env("DESKD_MODERATION_API_KEY") {
            self.moderation.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DESKD_SENTIMENT_BASE_URL") {
            self.sentiment.base_url = Some(value);
        }
        if let Some(value) = read_env("DESKD_SENTIMENT_API_KEY") {
            self.sentiment.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DESKD_SEARCH_BASE_URL") {
            self.search.base_url = Some(value);
        }
        if let Some(value) = read_env("DESKD_SEARCH_API_KEY") {
            self.search.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DESKD_DIRECTORY_BASE_URL") {
            self.directory.base_url = Some(value);
        }
        if let Some(value) = read_env("DESKD_DIRECTORY_API_KEY") {
            self.directory.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DESKD_AUTOMATION_BASE_URL") {
            self.automation.base_url = Some(value);
        }
        if let Some(value) = read_env("DESKD_AUTOMATION_API_KEY") {
            self.automation.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DESKD_ESCALATION_WEBHOOK_URL") {
            self.automation.escalation_webhook_url = Some(value);
        }
        if let Some(value) = read_env("DESKD_SPEECH_BASE_URL") {
            self.speech.base_url = Some(value);
        }
        if let Some(value) = read_env("DESKD_SPEECH_API_KEY") {
            self.speech.api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("DESKD_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("DESKD_SERVER_PORT") {
            self.server.port = parse_u16("DESKD_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("DESKD_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("DESKD_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        if let Some(value) = read_env("DESKD_SESSION_IDLE_TTL_SECS") {
            self.sessions.idle_ttl_secs = parse_u64("DESKD_SESSION_IDLE_TTL_SECS", &value)?;
        }

        let log_level = read_env("DESKD_LOGGING_LEVEL").or_else(|| read_env("DESKD_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("DESKD_LOGGING_FORMAT").or_else(|| read_env("DESKD_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(base_url) = overrides.completion_base_url {
            self.completion.base_url = base_url;
        }
        if let Some(api_key) = overrides.completion_api_key {
            self.completion.api_key = Some(secret_value(api_key));
        }
        if let Some(model) = overrides.completion_model {
            self.completion.model = model;
        }
        if let Some(base_url) = overrides.moderation_base_url {
            self.moderation.base_url = Some(base_url);
        }
        if let Some(idle_ttl_secs) = overrides.session_idle_ttl_secs {
            self.sessions.idle_ttl_secs = idle_ttl_secs;
        }
        if let Some(max_sessions) = overrides.session_max_sessions {
            self.sessions.max_sessions = max_sessions;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_completion(&self.completion)?;
        validate_moderation(&self.moderation)?;
        validate_search(&self.search)?;
        validate_automation(&self.automation)?;
        validate_sessions(&self.sessions)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("deskd.toml"), PathBuf::from("config/deskd.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_completion(completion: &CompletionConfig) -> Result<(), ConfigError> {
    if completion.base_url.trim().is_empty() {
        return Err(ConfigError::Validation("completion.base_url is required".to_string()));
    }
    if completion.model.trim().is_empty() {
        return Err(ConfigError::Validation("completion.model is required".to_string()));
    }
    if !(0.0..=2.0).contains(&completion.temperature) {
        return Err(ConfigError::Validation(
            "completion.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }
    if completion.max_tool_rounds == 0 || completion.max_tool_rounds > 16 {
        return Err(ConfigError::Validation(
            "completion.max_tool_rounds must be in range 1..=16".to_string(),
        ));
    }
    if let Some(api_key) = &completion.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "completion.api_key must not be blank when set".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_moderation(moderation: &ModerationConfig) -> Result<(), ConfigError> {
    if moderation.severity_cutoff > 7 {
        return Err(ConfigError::Validation(
            "moderation.severity_cutoff must be in range 0..=7".to_string(),
        ));
    }
    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if search.top_k == 0 || search.top_k > 20 {
        return Err(ConfigError::Validation("search.top_k must be in range 1..=20".to_string()));
    }
    if !(0.0..=1.0).contains(&search.relevance_floor) {
        return Err(ConfigError::Validation(
            "search.relevance_floor must be in range 0.0..=1.0".to_string(),
        ));
    }
    Ok(())
}

fn validate_automation(automation: &AutomationConfig) -> Result<(), ConfigError> {
    if automation.poll_initial_delay_ms == 0 {
        return Err(ConfigError::Validation(
            "automation.poll_initial_delay_ms must be greater than zero".to_string(),
        ));
    }
    if automation.poll_max_delay_ms < automation.poll_initial_delay_ms {
        return Err(ConfigError::Validation(
            "automation.poll_max_delay_ms must not be below poll_initial_delay_ms".to_string(),
        ));
    }
    if automation.poll_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "automation.poll_timeout_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_sessions(sessions: &SessionConfig) -> Result<(), ConfigError> {
    if sessions.idle_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "sessions.idle_ttl_secs must be greater than zero".to_string(),
        ));
    }
    if sessions.max_sessions == 0 {
        return Err(ConfigError::Validation(
            "sessions.max_sessions must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
    let level = logging.level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.level must be one of trace|debug|info|warn|error, got `{}`",
            logging.level
        )));
    }
    Ok(())
}
