//! Health check command - checks the cache and the archive root.

use exam_archive::CacheBackend;

use crate::backend::Runtime;
use crate::output::OutputFormat;

/// Run the health check command
pub async fn run(
    runtime: &Runtime,
    cache_label: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let cache = check_cache(runtime.cache.as_ref(), runtime.config.cache_timeout()).await;
    let root = runtime.config.archive_root.clone();
    let archive = runtime
        .engine
        .store()
        .ensure_directory(&root)
        .await
        .map_err(|e| e.to_string());
    let healthy = cache.is_ok() && archive.is_ok();

    match format {
        OutputFormat::Human => {
            match &cache {
                Ok(()) => println!("cache:   ok ({cache_label})"),
                Err(e) => println!("cache:   FAILED ({cache_label}): {e}"),
            }
            match &archive {
                Ok(()) => println!("archive: ok ({})", root.display()),
                Err(e) => println!("archive: FAILED ({}): {e}", root.display()),
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "status": if healthy { "healthy" } else { "unhealthy" },
                "cache": cache.err(),
                "archive": archive.err(),
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    if !healthy {
        std::process::exit(1);
    }
    Ok(())
}

async fn check_cache(cache: &dyn CacheBackend, limit: std::time::Duration) -> Result<(), String> {
    match tokio::time::timeout(limit, cache.ping()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(fault)) => Err(fault.to_string()),
        Err(_) => Err(format!("no response within {}ms", limit.as_millis())),
    }
}
