//! Cache inspection commands.

use exam_archive::ArchiveSyncEngine;

use crate::cli::UserArgs;
use crate::output::{OutputFormat, print_counters, print_table};

/// Run the `counters` command
pub async fn show(
    engine: &ArchiveSyncEngine,
    args: &UserArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let counters = engine.counters().bulk_read(&args.user).await?;
    print_counters(&counters, format)
}

/// Run the `users` command
pub async fn users(
    engine: &ArchiveSyncEngine,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let users = engine.active_users().await?;
    match format {
        OutputFormat::Human => {
            if users.is_empty() {
                println!("No active users.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = users.into_iter().map(|user| vec![user]).collect();
            print_table(&["USER"], &rows);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&users)?),
    }
    Ok(())
}
