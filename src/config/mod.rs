mod settings;

pub use settings::{
    DatabaseConfig, DeliveryConfig, ListenerConfig, MailConfig, OtelConfig, RedisConfig,
    ServerConfig, Settings, TemplateStoreConfig,
};
