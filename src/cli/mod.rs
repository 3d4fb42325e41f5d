//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;
pub mod types;

pub use context::AppContext;
pub use types::{Cli, Commands};

/// Run one parsed command against an open context.
pub async fn dispatch(command: Commands, ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Ingest(args) => commands::ingest::execute(args, ctx, json).await,
        Commands::Search(args) => commands::search::execute(args, ctx, json).await,
        Commands::Ask(args) => commands::ask::execute(args, ctx, json).await,
        Commands::Rebuild(args) => commands::rebuild::execute(args, ctx, json).await,
        Commands::Stats => commands::stats::execute(ctx, json).await,
    }
}

/// Print an error in the requested format and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json: bool) -> ! {
    if json {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({ "error": err.to_string(), "causes": causes });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
