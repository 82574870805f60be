use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use repolens_core::models::SearchRequest;
use repolens_core::providers::GitHubProvider;
use repolens_core::readme::fetch_readme;
use repolens_core::{
    Config, OrderBy, QueryParams, ReadmeController, SearchController, SearchProvider, SortBy,
};
use repolens_tui::{run_tui, ui::format_number, App};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "repolens")]
#[command(version, about = "Search GitHub repositories from the terminal", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/repolens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitHub token, overrides the config file
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Interactive search (default)
    Tui,
    /// Fetch one page of results
    Search {
        /// Search term
        term: String,
        /// Earliest creation date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest creation date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// updated, stars, forks or help-wanted-issues
        #[arg(long)]
        sort: Option<SortBy>,
        /// asc or desc
        #[arg(long)]
        order: Option<OrderBy>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a repository README
    Readme {
        /// Repository name (owner/repo)
        name: String,
        /// Print the markdown source instead of rendering it
        #[arg(long)]
        raw: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let tui_mode = matches!(cli.command, None | Some(Commands::Tui));
    init_logging(tui_mode)?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if cli.token.is_some() {
        config.github.token = cli.token.clone();
    }

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let provider = Arc::new(GitHubProvider::from_config(&config));
            let search = SearchController::spawn(provider.clone(), config.controller_settings());
            let readme = ReadmeController::spawn(provider);
            let app = App::new(config.initial_params(), config.pagination());
            run_tui(app, search, readme).await?;
        }
        Commands::Search {
            term,
            from,
            to,
            sort,
            order,
            page,
            json,
        } => {
            let mut params = config.initial_params();
            params.search_term = term;
            params.created_from = from.unwrap_or(params.created_from);
            params.created_to = to.unwrap_or(params.created_to);
            params.sort_by = sort.unwrap_or(params.sort_by);
            params.order_by = order.unwrap_or(params.order_by);
            params.page = page.max(1);
            search_once(&config, &params, json).await?;
        }
        Commands::Readme { name, raw } => {
            let provider = GitHubProvider::from_config(&config);
            let readme = fetch_readme(&provider, &name).await?;
            if raw {
                println!("{}", readme);
            } else {
                termimad::MadSkin::default().print_text(&readme);
            }
        }
        Commands::Config { init } => {
            if init {
                let path = match &cli.config {
                    Some(path) => {
                        config.save_to(path)?;
                        path.clone()
                    }
                    None => config.save()?,
                };
                println!("Wrote {}", path.display());
            } else {
                let path = match &cli.config {
                    Some(path) => path.clone(),
                    None => Config::config_path()?,
                };
                println!("# {}", path.display());
                let mut shown = config.clone();
                if shown.github.token.is_some() {
                    shown.github.token = Some("<redacted>".to_string());
                }
                print!("{}", toml::to_string_pretty(&shown)?);
            }
        }
    }

    Ok(())
}

async fn search_once(config: &Config, params: &QueryParams, json: bool) -> anyhow::Result<()> {
    if !params.is_searchable() {
        println!("Nothing to search: the term is blank or the date range is reversed.");
        return Ok(());
    }

    let provider = GitHubProvider::from_config(config);
    let request = SearchRequest::for_page(params, params.page, config.per_page());
    tracing::info!("Searching for: {}", request.query);

    let page = provider
        .search(&request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch repositories: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.items.is_empty() {
        println!("No repositories found for \"{}\".", params.trimmed_term());
    }
    for repo in &page.items {
        println!(
            "{}  ⭐ {}  🍴 {}  ❗ {}",
            repo.full_name,
            format_number(repo.stargazers_count),
            format_number(repo.forks_count),
            format_number(repo.open_issues_count)
        );
        match &repo.owner {
            Some(owner) => println!("    by {}", owner.login),
            None => println!("    No owner information"),
        }
        println!(
            "    {}",
            repo.html_url.as_deref().unwrap_or("Repository unavailable")
        );
    }
    println!();
    println!("{}", config.pagination().summary(params.page, page.total_count));

    Ok(())
}

/// Logs go to stderr, or to a file while the TUI owns the screen
fn init_logging(tui_mode: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "repolens=info".into());

    if tui_mode {
        let dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("repolens");
        let file = open_log_file(&dir)?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn open_log_file(dir: &Path) -> anyhow::Result<std::fs::File> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let path = dir.join("repolens.log");
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
