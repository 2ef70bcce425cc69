//! Engine construction and utility functions.

use std::sync::Arc;

use exam_archive::{
    ArchiveSyncEngine, CacheBackend, DefaultAvatar, EngineConfig, FixedCatalog, InMemoryCache,
    RedisCache,
};

use crate::cli::{CacheKind, EngineArgs};

/// Redact credentials from a Redis connection URL for safe logging
pub fn redact_redis_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "redis://***@<unparsable-url>".to_string()
    }
}

/// Merge the optional config file with command-line overrides.
pub fn build_config(args: &EngineArgs) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading config file");
            EngineConfig::from_json_file(path)?
        }
        None => EngineConfig::default(),
    };

    if let Some(root) = &args.archive_root {
        config.archive_root = root.clone();
    }
    if let Some(key_root) = &args.key_root {
        config.key_root = key_root.clone();
    }
    if let Some(avatar) = &args.default_avatar {
        config.default_avatar_path = Some(avatar.clone());
    }
    if let Some(secs) = args.cache_timeout {
        config.cache_timeout_secs = secs;
    }
    if let Some(secs) = args.file_timeout {
        config.file_timeout_secs = secs;
    }
    if let Some(secs) = args.flow_timeout {
        config.flow_timeout_secs = secs;
    }
    if let Some(secs) = args.code_ttl {
        config.verify_code_ttl_secs = secs;
    }
    if let Some(workers) = args.blocking_workers {
        config.blocking_workers = workers;
    }
    config.validate()?;
    Ok(config)
}

/// Create the cache backend selected on the command line
pub async fn create_cache(
    args: &EngineArgs,
    config: &EngineConfig,
) -> Result<Arc<dyn CacheBackend>, Box<dyn std::error::Error>> {
    match args.cache {
        CacheKind::Redis => {
            let display_url = redact_redis_url(&args.redis_url);
            tracing::info!("Connecting to Redis at {}", display_url);
            match RedisCache::connect(&args.redis_url, config.cache_timeout()).await {
                Ok(cache) => Ok(Arc::new(cache)),
                Err(e) => Err(format!("Failed to connect to Redis at {display_url}: {e}").into()),
            }
        }
        CacheKind::Memory => {
            tracing::warn!("Using in-memory cache; session state ends with this process");
            Ok(Arc::new(InMemoryCache::new()))
        }
    }
}

/// Everything a command needs.
pub struct Runtime {
    pub engine: ArchiveSyncEngine,
    pub cache: Arc<dyn CacheBackend>,
    pub config: EngineConfig,
}

/// Build the engine from command-line settings.
pub async fn create_runtime(args: &EngineArgs) -> Result<Runtime, Box<dyn std::error::Error>> {
    let config = build_config(args)?;
    let cache = create_cache(args, &config).await?;
    let default_avatar = match &config.default_avatar_path {
        Some(path) => DefaultAvatar::load(path),
        None => DefaultAvatar::default(),
    };
    let engine = ArchiveSyncEngine::new(
        &config,
        Arc::clone(&cache),
        Arc::new(FixedCatalog(args.questions)),
        default_avatar,
    );
    Ok(Runtime {
        engine,
        cache,
        config,
    })
}

/// Cache label for display.
pub fn cache_label(args: &EngineArgs) -> String {
    match args.cache {
        CacheKind::Redis => format!("redis ({})", redact_redis_url(&args.redis_url)),
        CacheKind::Memory => "memory".to_string(),
    }
}
