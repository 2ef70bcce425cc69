//! Verification code command.

use exam_archive::ArchiveSyncEngine;

use crate::cli::UserArgs;
use crate::output::OutputFormat;

/// Run the `issue-code` command
pub async fn issue(
    engine: &ArchiveSyncEngine,
    args: &UserArgs,
    ttl_secs: u64,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(code) = engine.issue_code(&args.user).await? else {
        return Err(format!("cache unavailable; no code issued for {}", args.user).into());
    };
    match format {
        OutputFormat::Human => println!("{code} (valid for {ttl_secs}s)"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "user": args.user, "code": code, "ttl_secs": ttl_secs })
        ),
    }
    Ok(())
}
