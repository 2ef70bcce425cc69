use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("exam_archive=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.output);
    let cache_label = backend::cache_label(&cli.engine);

    let runtime = match backend::create_runtime(&cli.engine).await {
        Ok(runtime) => runtime,
        Err(e) if matches!(cli.command, Commands::Health) => {
            eprintln!("unhealthy: {e}");
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };
    let engine = &runtime.engine;

    match &cli.command {
        Commands::Provision(args) => {
            commands::session::provision(engine, args, cli.engine.questions, format).await
        }
        Commands::Login(args) => commands::session::login(engine, args, format).await,
        Commands::Logout(args) => commands::session::logout(engine, args, format).await,
        Commands::Rename(args) => commands::session::rename(engine, args, format).await,
        Commands::Delete(args) => commands::session::delete(engine, args, format).await,
        Commands::IssueCode(args) => {
            let ttl = runtime.config.verify_code_ttl_secs;
            commands::codes::issue(engine, args, ttl, format).await
        }
        Commands::Counters(args) => commands::counters::show(engine, args, format).await,
        Commands::Users => commands::counters::users(engine, format).await,
        Commands::Health => commands::health::run(&runtime, &cache_label, format).await,
    }
}
