mod settings;

pub use settings::{
    CacheConfig, LoggingConfig, RemoteConfig, SearchConfig, Settings, StorageBackend,
    StorageConfig, UsageConfig,
};
