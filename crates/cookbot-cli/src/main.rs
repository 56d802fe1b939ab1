//! cookbot CLI - daily cooking plans from a chain of model roles
//!
//! Usage:
//!   cookbot init                 Write the default cookbot.toml
//!   cookbot run                  Run one daily pipeline
//!   cookbot vote <N>             Record the winner of the pending poll
//!   cookbot memory show|clear    Inspect or reset session memory
//!   cookbot choose               Preview today's cuisine draw
//!   cookbot catalog              List regions and cuisines

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cookbot_agent::{CredentialPool, Gateway, GatewayPolicy, GoogleSearch};
use cookbot_core::{CookbotConfig, CookbotError, CONFIG_FILE_NAME};
use cookbot_memory::{diversity, MemoryStore};
use cookbot_orchestrator::{Pipeline, RunOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "cookbot")]
#[command(author, version, about = "Daily cooking plans from a chain of model roles")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to ./cookbot.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run one daily pipeline and print the plan
    Run {
        /// Wish for today, read by the analyst first
        #[arg(short, long)]
        request: Option<String>,
    },

    /// Record the winner of the pending poll (1-based)
    Vote {
        option: usize,
    },

    /// Session memory
    Memory {
        #[command(subcommand)]
        action: MemoryCommands,
    },

    /// Preview the cuisine draw against current memory
    Choose {
        /// Cuisine to try first
        #[arg(short, long)]
        suggested: Option<String>,
    },

    /// List regions and cuisines
    Catalog,
}

#[derive(Subcommand)]
enum MemoryCommands {
    /// Print stored memory
    Show,
    /// Reset memory to empty defaults
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    match cli.command {
        Commands::Init { force } => cmd_init(&config_path, force),
        Commands::Run { request } => cmd_run(&config_path, request).await,
        Commands::Vote { option } => cmd_vote(&config_path, option),
        Commands::Memory { action } => match action {
            MemoryCommands::Show => cmd_memory_show(&config_path),
            MemoryCommands::Clear => cmd_memory_clear(&config_path),
        },
        Commands::Choose { suggested } => cmd_choose(&config_path, suggested),
        Commands::Catalog => cmd_catalog(&config_path),
    }
}

fn load_config(path: &Path) -> Result<CookbotConfig> {
    CookbotConfig::load_or_default(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

fn memory_store(config: &CookbotConfig) -> MemoryStore {
    MemoryStore::new(config.memory_dir.clone()).with_limits(config.memory.clone())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    CookbotConfig::write_default(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let config = CookbotConfig::default();
    println!("Wrote {}", path.display());
    println!("\nCredentials are read from the environment:");
    println!(
        "  {} (and {}_2 .. {}_10)",
        config.model.api_key_env, config.model.api_key_env, config.model.api_key_env
    );
    println!(
        "  {} and {} (optional, enables web search)",
        config.search.api_key_env, config.search.cx_env
    );
    Ok(())
}

async fn cmd_run(path: &Path, request: Option<String>) -> Result<()> {
    let config = load_config(path)?;

    let pool = CredentialPool::from_env(&config.model.api_key_env);
    if pool.is_empty() {
        return Err(CookbotError::NoCredentials(config.model.api_key_env.clone()).into());
    }
    info!("Loaded {} credential(s)", pool.len());

    let gateway = Arc::new(Gateway::groq(
        &config.model,
        pool,
        GatewayPolicy::from(&config.gateway),
    ));
    let search = Arc::new(GoogleSearch::from_env(
        &config.search.api_key_env,
        &config.search.cx_env,
    ));

    let pipeline = Pipeline::new(config, gateway, search);
    let outcome = pipeline.run(request.as_deref()).await?;

    match outcome {
        RunOutcome::DailyPlan {
            markdown,
            path,
            poll,
            ..
        } => {
            println!("{}", markdown);
            if let Some(path) = path {
                println!("Saved to {}", path.display());
            }
            println!("Vote with 'cookbot vote <1-{}>'", poll.options.len());
        }
        RunOutcome::NothingToOffer { cuisine, reason } => {
            println!("Nothing to offer today ({}): {}", cuisine, reason);
        }
    }
    Ok(())
}

fn cmd_vote(path: &Path, option: usize) -> Result<()> {
    let config = load_config(path)?;
    let store = memory_store(&config);
    let mut memory = store.load();

    let Some(poll) = &memory.last_poll else {
        bail!("No pending poll");
    };
    if option == 0 || option > poll.options.len() {
        bail!(
            "Option must be between 1 and {} (got {})",
            poll.options.len(),
            option
        );
    }

    let dish = memory.consume_poll(Some(option));
    store.save(&memory).context("Failed to save memory")?;

    match dish {
        Some(dish) => println!("Recorded vote for {}", dish),
        None => println!("Poll closed"),
    }
    Ok(())
}

fn print_list(title: &str, items: &[String]) {
    println!("{} ({}):", title, items.len());
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        println!("  - {}", item);
    }
}

fn cmd_memory_show(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let store = memory_store(&config);
    let memory = store.load();

    println!("Session memory ({})", store.dir().display());
    println!("==============");
    print_list("Recent cuisines", &memory.last_cuisines);
    print_list("Recent regions", &memory.last_regions);
    print_list("Recent ideas", &memory.last_trends);
    print_list("Liked dishes", &memory.liked_trends);
    print_list("Insights", &memory.user_insights);

    match &memory.last_poll {
        Some(poll) => {
            println!("Pending poll {}:", poll.message_id);
            for (i, option) in poll.options.iter().enumerate() {
                println!("  {}. {}", i + 1, option);
            }
        }
        None => println!("No pending poll"),
    }
    Ok(())
}

fn cmd_memory_clear(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let store = memory_store(&config);
    store.clear().context("Failed to clear memory")?;
    println!("Cleared session memory in {}", store.dir().display());
    Ok(())
}

fn cmd_choose(path: &Path, suggested: Option<String>) -> Result<()> {
    let config = load_config(path)?;
    let memory = memory_store(&config).load();

    let cuisine = diversity::choose_for(&memory, suggested.as_deref(), &config.catalog);
    println!("{} ({})", cuisine, config.catalog.region_of(&cuisine));
    Ok(())
}

fn cmd_catalog(path: &Path) -> Result<()> {
    let config = load_config(path)?;

    for region in config.catalog.regions() {
        println!("{}", region.name);
        for cuisine in &region.cuisines {
            println!("  - {}", cuisine);
        }
    }
    Ok(())
}
