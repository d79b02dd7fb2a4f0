use std::path::PathBuf;

use clap::{Parser, Subcommand};

use repolens::commands::analyses;
use repolens::commands::db::AnalysisStore;
use repolens::github::GithubClient;

#[derive(Parser)]
#[command(
    name = "repolens",
    version,
    about = "Make GitHub portfolio health visible, measurable, and actionable"
)]
struct Cli {
    /// Path to the analyses database
    #[arg(long, global = true, default_value = "repolens.db")]
    db: PathBuf,

    /// GitHub API base URL (override for GitHub Enterprise or testing)
    #[arg(long, global = true, default_value = GithubClient::DEFAULT_BASE_URL)]
    github_api: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a public github.com profile URL and store the result
    Analyze {
        /// Profile URL, e.g. https://github.com/octocat
        profile_url: String,
    },
    /// Print one stored analysis as JSON
    Show { id: String },
    /// List stored analyses, newest first
    List {
        /// Maximum number of analyses to return (1-50, default 10)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the repository snapshots captured by an analysis
    Repos { id: String },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), analyses::AnalysisError> {
    let store = AnalysisStore::open(&cli.db)?;
    let github = GithubClient::with_base_url(cli.github_api);

    match cli.command {
        Commands::Analyze { profile_url } => {
            let analysis = analyses::create_analysis(&store, &github, &profile_url).await?;
            print_json(&analysis);
        }
        Commands::Show { id } => {
            print_json(&analyses::get_analysis(&store, &id)?);
        }
        Commands::List { limit } => {
            print_json(&analyses::list_analyses(&store, limit)?);
        }
        Commands::Repos { id } => {
            print_json(&analyses::get_analysis_repos(&store, &id)?);
        }
    }

    Ok(())
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    );
}
