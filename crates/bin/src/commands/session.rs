//! Session-boundary commands: provision, login, logout, rename, delete.

use exam_archive::ArchiveSyncEngine;

use crate::cli::{LoginArgs, RenameArgs, UserArgs};
use crate::output::{OutputFormat, print_counters};

/// An archive seeded from an empty catalog can never be loaded.
fn require_questions(questions: u64) -> Result<(), String> {
    if questions == 0 {
        return Err("provision needs a non-empty catalog; pass --questions N".to_string());
    }
    Ok(())
}

/// Run the `provision` command
pub async fn provision(
    engine: &ArchiveSyncEngine,
    args: &UserArgs,
    questions: u64,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    require_questions(questions)?;
    engine.create_for_new_user(&args.user).await?;
    let dir = engine.layout().user_dir(&args.user)?;
    match format {
        OutputFormat::Human => println!("Provisioned {} at {}", args.user, dir.display()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "user": args.user, "archive": dir })
        ),
    }
    Ok(())
}

/// Run the `login` command
pub async fn login(
    engine: &ArchiveSyncEngine,
    args: &LoginArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let counters = match &args.code {
        Some(code) => engine.login_with_code(&args.user, code).await?,
        None => engine.load_on_login(&args.user).await?,
    };
    if format == OutputFormat::Human {
        println!("Loaded {} counters for {}", counters.len(), args.user);
    }
    print_counters(&counters, format)
}

/// Run the `logout` command
pub async fn logout(
    engine: &ArchiveSyncEngine,
    args: &UserArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let counters = engine.flush_on_logout(&args.user).await?;
    if format == OutputFormat::Human {
        println!("Flushed {} counters for {}", counters.len(), args.user);
    }
    print_counters(&counters, format)
}

/// Run the `rename` command
pub async fn rename(
    engine: &ArchiveSyncEngine,
    args: &RenameArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    engine.rename(&args.old, &args.new).await?;
    match format {
        OutputFormat::Human => println!("Renamed {} to {}", args.old, args.new),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "old": args.old, "new": args.new })
        ),
    }
    Ok(())
}

/// Run the `delete` command
pub async fn delete(
    engine: &ArchiveSyncEngine,
    args: &UserArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = engine.delete(&args.user).await {
        if let exam_archive::Error::Sync(sync) = &e {
            for failure in sync.failures() {
                eprintln!("  {failure}");
            }
        }
        return Err(e.into());
    }
    match format {
        OutputFormat::Human => println!("Deleted {}", args.user),
        OutputFormat::Json => println!("{}", serde_json::json!({ "deleted": args.user })),
    }
    Ok(())
}
