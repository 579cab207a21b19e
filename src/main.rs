use clap::Parser;
use keepsync::cli::{commands, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with secret output on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Passphrase => {
            commands::passphrase::execute();
            Ok(())
        }
        Commands::Register { ref login } => commands::register::execute(&cli, login).await,
        Commands::Login { ref login } => commands::login::execute(&cli, login).await,
        Commands::Add {
            kind,
            ref description,
            ref value,
            ref file,
        } => {
            commands::add::execute(&cli, kind, description, value.as_deref(), file.as_deref())
                .await
        }
        Commands::List { all } => commands::list::execute(&cli, all).await,
        Commands::Show { id, ref out } => commands::show::execute(&cli, id, out.as_deref()).await,
        Commands::Describe {
            id,
            ref description,
        } => commands::describe::execute(&cli, id, description).await,
        Commands::Delete { id, force } => commands::delete::execute(&cli, id, force).await,
        Commands::Sync => commands::sync_cmd::execute(&cli).await,
        Commands::Watch => commands::watch::execute(&cli).await,
    };

    if let Err(e) = result {
        keepsync::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
