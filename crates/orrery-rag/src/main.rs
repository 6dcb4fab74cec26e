//! CLI entry point for the Orrery question-answering engine.
//!
//! Designed for subprocess invocation from the presentation layer:
//! results are printed as JSON on stdout, logs go to stderr.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use orrery_core::AnswerResponse;
use orrery_graph::{GraphClient, GraphConfig};
use orrery_llm::{LlmProvider, OpenAiCompatibleProvider};
use orrery_rag::{GraphRagEngine, RagConfig};

#[derive(Parser)]
#[command(name = "orrery-rag")]
#[command(about = "Question answering over the Orrery knowledge graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: orrery).
    #[arg(short, long, default_value = "orrery", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a natural-language question (prints an AnswerResponse as JSON).
    Ask {
        question: String,

        /// Force a fresh schema snapshot before answering.
        #[arg(long)]
        refresh_schema: bool,
    },
    /// Print the rendered schema snapshot consumed by the generation prompt.
    Schema {
        /// Re-introspect instead of serving the cached snapshot.
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let rag_config = load_rag_config(&cli.config)?;
    let graph_config = load_graph_config(&cli.config);

    // Connect to Neo4j. An unreachable store is a well-formed not-ready
    // answer for `ask`, not a crash.
    let graph = match connect_and_verify(&graph_config).await {
        Ok(graph) => graph,
        Err(e) => {
            if matches!(cli.command, Command::Ask { .. }) {
                let response = AnswerResponse::not_ready(
                    format!("The graph store is unreachable; the service is not ready: {e}."),
                    Vec::new(),
                );
                println!("{}", serde_json::to_string(&response)?);
                return Ok(());
            }
            anyhow::bail!("failed to connect to the graph store: {e}");
        }
    };

    let api_key = rag_config.resolve_api_key();
    let cypher_llm = build_provider(&rag_config, &rag_config.cypher_model, api_key.clone())?;
    let qa_llm = build_provider(&rag_config, &rag_config.qa_model, api_key)?;
    let engine = GraphRagEngine::new(graph, cypher_llm, qa_llm, &rag_config);

    match cli.command {
        Command::Ask {
            question,
            refresh_schema,
        } => {
            if refresh_schema {
                if let Err(e) = engine.refresh_schema().await {
                    tracing::warn!(error = %e, "Forced schema refresh failed");
                }
            }
            let response = engine.ask(&question).await;
            println!("{}", serde_json::to_string(&response)?);
        }
        Command::Schema { refresh } => {
            let snapshot = engine.schema_snapshot(refresh).await?;
            println!("{}", snapshot.rendered);
        }
    }

    Ok(())
}

async fn connect_and_verify(
    config: &GraphConfig,
) -> Result<GraphClient, orrery_graph::GraphError> {
    let graph = GraphClient::connect(config).await?;
    graph.verify_connectivity().await?;
    Ok(graph)
}

fn build_provider(
    config: &RagConfig,
    model: &str,
    api_key: Option<String>,
) -> anyhow::Result<LlmProvider> {
    let provider = OpenAiCompatibleProvider::new(
        config.api_base_url.clone(),
        model.to_string(),
        config.temperature,
        config.max_output_tokens,
        config.llm_timeout_secs,
        api_key,
    )?;
    Ok(LlmProvider::OpenAiCompatible(provider))
}

fn load_rag_config(file_prefix: &str) -> anyhow::Result<RagConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("ORRERY")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<RagConfig>("rag") {
        Ok(c) => Ok(c),
        Err(_) => Ok(RagConfig::default()),
    }
}

fn load_graph_config(file_prefix: &str) -> GraphConfig {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("ORRERY")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    match cfg {
        Ok(c) => GraphConfig {
            uri: c
                .get_string("neo4j.uri")
                .unwrap_or_else(|_| "bolt://localhost:7687".to_string()),
            user: c
                .get_string("neo4j.user")
                .unwrap_or_else(|_| "neo4j".to_string()),
            password: c
                .get_string("neo4j.password")
                .unwrap_or_else(|_| "orrery-dev".to_string()),
            ..Default::default()
        },
        Err(_) => GraphConfig::default(),
    }
}
