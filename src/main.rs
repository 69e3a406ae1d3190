use clap::Parser;
use kgseq::cli::{Cli, Commands};
use kgseq::cli_handlers;
use kgseq::mcp::run_mcp_server;
use std::process;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays clean for output and the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings();

    let result = match cli.command {
        Commands::Import { file } => cli_handlers::handle_import(&settings, &file),
        Commands::Order { input } => cli_handlers::handle_order(&settings, input.as_deref()),
        Commands::Sequence { input } => {
            cli_handlers::handle_sequence(&settings, input.as_deref())
        }
        Commands::Check { input, strict } => {
            cli_handlers::handle_check(&settings, input.as_deref(), strict)
        }
        Commands::Status => cli_handlers::handle_status(&settings),
        Commands::Mcp => {
            if let Err(e) = run_mcp_server(settings.db_path).await {
                eprintln!("MCP server error: {e}");
                process::exit(1);
            }
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
