use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub listener: ListenerConfig,
    pub mail: MailConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub templates: TemplateStoreConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Channels carrying notification commands. Glob patterns are psubscribed.
    #[serde(default)]
    pub channels: Vec<String>,
}

/// Queue listener redelivery policy
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    /// Attempts per command, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial retry delay in milliseconds
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
    /// Upper bound for a single retry delay in milliseconds
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Commands handled concurrently; further messages wait for a free slot
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

/// Addresses and culture used when composing messages
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_culture")]
    pub default_culture: String,
    pub no_reply_email: String,
    #[serde(default)]
    pub no_reply_name: Option<String>,
    pub support_email: String,
    /// Link to a remark, `{remarkId}` is replaced with the remark identifier
    #[serde(default = "default_remark_url")]
    pub remark_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// "sendgrid" or "memory"
    #[serde(default = "default_delivery_backend")]
    pub backend: String,
    #[serde(default)]
    pub sendgrid_api_key: Option<String>,
    #[serde(default = "default_sendgrid_api_url")]
    pub sendgrid_api_url: String,
    #[serde(default = "default_delivery_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateStoreConfig {
    /// "memory" or "postgres"
    #[serde(default = "default_template_backend")]
    pub backend: String,
    /// JSON file with an array of templates, loaded into the memory store
    #[serde(default)]
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
    /// Emit JSON formatted log lines instead of the human readable format
    #[serde(default)]
    pub json_logs: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_initial_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    10_000
}

fn default_max_in_flight() -> usize {
    64
}

fn default_culture() -> String {
    "en-US".to_string()
}

fn default_remark_url() -> String {
    "http://localhost:3000/remarks/{remarkId}".to_string()
}

fn default_delivery_backend() -> String {
    "sendgrid".to_string()
}

fn default_sendgrid_api_url() -> String {
    "https://api.sendgrid.com/v3".to_string()
}

fn default_delivery_timeout() -> u64 {
    10
}

fn default_template_backend() -> String {
    "memory".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_idle_timeout() -> u32 {
    300
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "ara-mailer".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8082)?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("mail.default_culture", "en-US")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // MAIL__NO_REPLY_EMAIL, DELIVERY__SENDGRID_API_KEY, REDIS__URL, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("redis.channels"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            channels: vec![],
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            backend: default_delivery_backend(),
            sendgrid_api_key: None,
            sendgrid_api_url: default_sendgrid_api_url(),
            timeout_seconds: default_delivery_timeout(),
        }
    }
}

impl Default for TemplateStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_template_backend(),
            seed_path: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: default_pool_size(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
            json_logs: false,
        }
    }
}

impl MailConfig {
    /// Minimal mail configuration, used by tests and local tooling
    pub fn new(no_reply_email: impl Into<String>, support_email: impl Into<String>) -> Self {
        Self {
            default_culture: default_culture(),
            no_reply_email: no_reply_email.into(),
            no_reply_name: None,
            support_email: support_email.into(),
            remark_url: default_remark_url(),
        }
    }
}
