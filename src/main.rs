// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use mindgarden::agent::{FAREWELL, greeting};
use mindgarden::database::operations::{self, NewMemory};
use mindgarden::utils::logging::{
    format_error, format_info, format_speaker, format_success, format_warning, init_logger,
};
use mindgarden::utils::{ComponentHealth, LogSettings};
use mindgarden::{
    Agent, ChatModel, Config, EntityProcessor, GraphClient, GraphMemoryStore, HealthReport,
    MemoryBackend, MemoryManager, MemoryStore, Neo4jManager, OpenAiClient, OperationTimer,
    SchemaManager, Validator,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye"];

#[derive(Parser)]
#[command(name = "mindgarden")]
#[command(version)]
#[command(about = "Personal memory and assistant system", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Show error details instead of a generic message
        #[arg(short, long)]
        debug: bool,

        /// Keep memories in Neo4j instead of in-process
        #[arg(long)]
        graph: bool,
    },

    /// Send a single message and print the reply
    Ask {
        message: String,

        #[arg(long)]
        graph: bool,
    },

    /// Store a memory in the knowledge graph
    Remember {
        text: String,

        #[arg(short, long, default_value = "user")]
        source: String,

        /// Extract entities and topics and link them to the memory
        #[arg(long)]
        extract: bool,
    },

    /// List memories from the knowledge graph
    Recall {
        query: Option<String>,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        #[arg(short, long, value_name = "NAME")]
        entity: Option<String>,
    },

    /// Extract entities, relationships and topics from text
    Extract {
        text: String,

        #[arg(short, long, default_value = "")]
        instructions: String,

        #[arg(long)]
        store: bool,
    },

    /// Create the graph indexes
    SetupDb,

    /// Delete every memory from the knowledge graph
    Forget {
        #[arg(long)]
        confirm: bool,
    },

    /// Check configuration and Neo4j connectivity
    Health,

    /// Show the MindGarden version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    colored::control::set_override(cli.color);

    let config_found = cli.config.exists();
    let config = if config_found {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        Config::load(None).context("Failed to load configuration")?
    };

    config
        .ensure_directories()
        .context("Failed to create data directories")?;

    init_logger(LogSettings {
        logging: &config.logging,
        logs_dir: &config.paths.logs_dir,
        colored_output: cli.color,
        verbose: cli.verbose,
    })
    .context("Failed to initialize logging")?;

    if config_found {
        info!("Loaded configuration from: {}", cli.config.display());
    } else {
        warn!(
            "Config file {} not found, using defaults and environment",
            cli.config.display()
        );
    }

    match cli.command {
        Commands::Chat { debug, graph } => cmd_chat(&config, debug, graph).await?,
        Commands::Ask { message, graph } => cmd_ask(&config, &message, graph).await?,
        Commands::Remember {
            text,
            source,
            extract,
        } => cmd_remember(&config, &text, &source, extract).await?,
        Commands::Recall {
            query,
            limit,
            entity,
        } => cmd_recall(&config, query.as_deref(), limit, entity.as_deref()).await?,
        Commands::Extract {
            text,
            instructions,
            store,
        } => cmd_extract(&config, &text, &instructions, store).await?,
        Commands::SetupDb => cmd_setup_db(&config).await?,
        Commands::Forget { confirm } => cmd_forget(&config, confirm).await?,
        Commands::Health => cmd_health(&config).await?,
        Commands::Version => {
            println!("MindGarden version: {}", env!("CARGO_PKG_VERSION").bold());
        }
    }

    Ok(())
}

fn check_api_key(config: &Config) -> bool {
    if config.has_api_key() {
        return true;
    }
    eprintln!(
        "{}",
        format_error("OPENAI_API_KEY is not set in the environment.")
    );
    eprintln!("Please set it using: export OPENAI_API_KEY=your_key_here");
    false
}

fn build_model(config: &Config) -> Result<Arc<dyn ChatModel>> {
    Validator::validate_api_key(&config.openai.api_key)?;
    let client = OpenAiClient::new(&config.openai, &config.agent.model)
        .context("Failed to create OpenAI client")?;
    Ok(Arc::new(client))
}

fn build_graph(config: &Config) -> Arc<Neo4jManager> {
    Arc::new(Neo4jManager::new(config.database.clone()))
}

fn build_memory(config: &Config, graph: bool) -> Box<dyn MemoryStore> {
    if graph || config.memory.backend == MemoryBackend::Graph {
        info!("Using Neo4j memory store at {}", config.database.uri);
        Box::new(GraphMemoryStore::new(build_graph(config)))
    } else {
        Box::new(MemoryManager::new())
    }
}

fn build_agent(config: &Config, graph: bool) -> Result<Agent> {
    let model = build_model(config)?;
    Ok(Agent::new(config, model, build_memory(config, graph)))
}

/// Runs `work` unless `interrupt` completes first, in which case `work` is
/// dropped and `None` returned.
async fn until_interrupted<F, I>(work: F, interrupt: I) -> Option<F::Output>
where
    F: Future,
    I: Future,
{
    tokio::select! {
        output = work => Some(output),
        _ = interrupt => None,
    }
}

async fn cmd_chat(config: &Config, debug: bool, graph: bool) -> Result<()> {
    if !check_api_key(config) {
        return Ok(());
    }

    let mut agent = build_agent(config, graph)?;
    let name = agent.name().to_string();
    println!("{}", format_speaker(&name, &greeting(&name), false));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\n{}: ", "You".blue().bold());
        std::io::stdout().flush()?;

        let line = match until_interrupted(lines.next_line(), tokio::signal::ctrl_c()).await {
            Some(line) => line.context("Failed to read input")?,
            None => {
                println!();
                None
            }
        };

        let Some(line) = line else {
            println!("{}", format_speaker(&name, FAREWELL, false));
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if EXIT_WORDS.contains(&input.to_lowercase().as_str()) {
            println!("{}", format_speaker(&name, FAREWELL, false));
            break;
        }

        let Some(outcome) =
            until_interrupted(agent.process_message(input), tokio::signal::ctrl_c()).await
        else {
            println!("\n{}", format_speaker(&name, FAREWELL, false));
            break;
        };

        match outcome {
            Ok(reply) => println!("\n{}", format_speaker(&name, &reply, false)),
            Err(e) => {
                error!("Chat turn failed: {}", e);
                if debug {
                    println!("{}", format_error(&e.to_string()));
                } else {
                    println!(
                        "{}",
                        format_error("Something went wrong. Please try again.")
                    );
                }
            }
        }
    }

    info!("Chat session ended after {} turns", agent.conversation_history().len() / 2);
    Ok(())
}

async fn cmd_ask(config: &Config, message: &str, graph: bool) -> Result<()> {
    if !check_api_key(config) {
        return Ok(());
    }

    let mut agent = build_agent(config, graph)?;
    let reply = agent
        .process_message(message)
        .await
        .context("Agent failed to answer")?;

    println!("{}", format_speaker(agent.name(), &reply, false));
    Ok(())
}

async fn cmd_remember(config: &Config, text: &str, source: &str, extract: bool) -> Result<()> {
    Validator::validate_message_not_empty(text)?;
    let graph = build_graph(config);

    let memory_id = operations::store_memory(graph.as_ref(), NewMemory::new(text, source))
        .await
        .context("Failed to store memory")?;
    println!("{}", format_success(&format!("Stored memory {}", memory_id)));

    if extract {
        if !check_api_key(config) {
            return Ok(());
        }

        let graph: Arc<dyn GraphClient> = graph;
        let processor = EntityProcessor::new(build_model(config)?, Some(graph));
        let extracted = processor.extract_entities_from_text(text, "").await;

        if extracted.is_empty() {
            println!("{}", format_warning("No entities or topics found"));
            return Ok(());
        }

        processor
            .store_entities(&extracted)
            .await
            .context("Failed to store extracted entities")?;
        processor.link_memory(&memory_id, &extracted).await;

        println!(
            "{}",
            format_success(&format!(
                "Linked {} entities and {} topics",
                extracted.entities.len(),
                extracted.topics.len()
            ))
        );
    }

    Ok(())
}

async fn cmd_recall(
    config: &Config,
    query: Option<&str>,
    limit: usize,
    entity: Option<&str>,
) -> Result<()> {
    let graph = build_graph(config);

    let memories = match (entity, query) {
        (Some(name), _) => {
            operations::retrieve_memories_by_entity(graph.as_ref(), name, limit).await
        }
        (None, Some(query)) => operations::search_memories(graph.as_ref(), query, limit).await,
        (None, None) => operations::retrieve_memories(graph.as_ref(), limit).await,
    };

    if memories.is_empty() {
        println!("{}", format_info("No memories found"));
        return Ok(());
    }

    for memory in &memories {
        println!(
            "{} {}",
            format!("[{}]", memory.date_str).dimmed(),
            Validator::truncate_text(&memory.display_line(), 200)
        );
    }
    info!("Recalled {} memories", memories.len());

    Ok(())
}

async fn cmd_extract(config: &Config, text: &str, instructions: &str, store: bool) -> Result<()> {
    if !check_api_key(config) {
        return Ok(());
    }

    let graph: Option<Arc<dyn GraphClient>> = if store {
        Some(build_graph(config))
    } else {
        None
    };
    let processor = EntityProcessor::new(build_model(config)?, graph);

    let timer = OperationTimer::start("entity extraction");
    let extracted = processor.extract_entities_from_text(text, instructions).await;
    timer.finish();

    println!(
        "{}",
        serde_json::to_string_pretty(&extracted).context("Failed to render extraction")?
    );

    if store {
        processor
            .store_entities(&extracted)
            .await
            .context("Failed to store extracted entities")?;
        println!("{}", format_success("Stored extracted entities"));
    }

    Ok(())
}

async fn cmd_setup_db(config: &Config) -> Result<()> {
    info!("Setting up Neo4j indexes");
    let graph = build_graph(config);

    SchemaManager::new(graph.as_ref())
        .setup_database()
        .await
        .context("Failed to set up database")?;

    println!("{}", format_success("Database indexes created"));
    Ok(())
}

async fn cmd_forget(config: &Config, confirm: bool) -> Result<()> {
    if !confirm {
        error!("This will delete all memories. Use --confirm to proceed");
        return Ok(());
    }

    warn!("Deleting all memories from the knowledge graph");
    let graph = build_graph(config);
    let before = operations::count_memories(graph.as_ref()).await?;
    operations::clear_memories(graph.as_ref())
        .await
        .context("Failed to clear memories")?;

    println!("{}", format_success(&format!("Deleted {} memories", before)));
    Ok(())
}

async fn cmd_health(config: &Config) -> Result<()> {
    let mut components = Vec::new();

    let timer = OperationTimer::start("configuration check");
    components.push(if config.has_api_key() {
        ComponentHealth::healthy("openai", timer.finish())
    } else {
        ComponentHealth::degraded("openai", "OPENAI_API_KEY is not set")
    });

    let graph = build_graph(config);
    let timer = OperationTimer::start("neo4j ping");
    components.push(match graph.ping().await {
        Ok(true) => {
            let count = operations::count_memories(graph.as_ref()).await.unwrap_or(0);
            info!("Neo4j holds {} memories", count);
            ComponentHealth::healthy("neo4j", timer.finish())
        }
        Ok(false) => ComponentHealth::unhealthy("neo4j", "unexpected ping result", timer.finish()),
        Err(e) => ComponentHealth::unhealthy("neo4j", e.to_string(), timer.finish()),
    });

    let report = HealthReport::from_components(components);
    println!("{}", report.render());

    if !report.is_healthy() {
        warn!("Health check reported problems at {}", graph.uri());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::{pending, ready};
    use std::time::Duration;

    #[tokio::test]
    async fn test_finished_work_is_returned() {
        assert_eq!(until_interrupted(ready(7), pending::<()>()).await, Some(7));
    }

    #[tokio::test]
    async fn test_interrupt_abandons_pending_turn() {
        let turn = async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            "reply"
        };
        let interrupt = tokio::time::sleep(Duration::from_millis(10));

        assert_eq!(until_interrupted(turn, interrupt).await, None);
    }
}
