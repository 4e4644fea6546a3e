// SPDX-License-Identifier: MIT

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;

use switchyard::config::{CheckpointConfig, EngineConfig};
use switchyard::graph::{
    tools_condition, Engine, GraphBuilder, GraphDefinition, ModelNode, RunOutcome, Target,
    ToolNode, ToolRegistry, ToolsRoute, WorkflowState,
};
use switchyard::kit::message::{Message, Role};
use switchyard::kit::model::openai::OpenAIModel;
use switchyard::tools;

const DEFAULT_SESSION_DIR: &str = ".switchyard/sessions";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one message to the assistant graph
    Chat {
        /// Session to continue (created on first use)
        #[arg(short, long)]
        session: String,

        /// The user message
        #[arg(short, long)]
        message: String,

        /// The model to use
        #[arg(long, default_value = "gpt-4o-mini")]
        model: String,
    },
    /// Inspect or delete stored sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand, Debug)]
enum SessionAction {
    /// Print a session's checkpoint as JSON
    Show { id: String },
    /// Delete a session's checkpoint
    Evict { id: String },
}

/// agent -> (tools -> agent)* -> end
async fn chat_graph(model_name: String) -> anyhow::Result<GraphDefinition> {
    let registry = ToolRegistry::with_tools(tools::create_tools()).await;
    for tool in registry.list().await {
        log::info!("Registered tool: {}", tool.name());
    }

    let model = Arc::new(OpenAIModel::new(model_name)?);
    let agent = ModelNode::new("agent", model)
        .with_instruction("You are a helpful assistant. Use the available tools when they help.")
        .with_tools(registry.list().await);

    let mut builder = GraphBuilder::new("chat");
    builder
        .register_node("agent", agent)?
        .register_node("tools", ToolNode::new(Arc::new(registry)))?
        .add_conditional_edge(
            "agent",
            tools_condition,
            [
                (ToolsRoute::Tools, Target::node("tools")),
                (ToolsRoute::End, Target::End),
            ],
        )?
        .add_edge("tools", "agent")?
        .set_entry("agent")?;
    Ok(builder.compile()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut config = EngineConfig::resolve(args.config.as_deref())
        .context("failed to load engine configuration")?;
    if config.checkpoint == CheckpointConfig::Memory {
        // Memory sessions would not survive this process
        config.checkpoint = CheckpointConfig::File {
            dir: PathBuf::from(DEFAULT_SESSION_DIR),
        };
    }
    let engine = Engine::from_config(&config)?;

    match args.command {
        Commands::Chat {
            session,
            message,
            model,
        } => {
            log::info!("Using model: {}", model);
            let graph = chat_graph(model).await?;
            let input = WorkflowState::empty().with_message(Message::user(message));

            let report = engine
                .execute(&graph, input, &session, &Default::default())
                .await?;

            let reply = report
                .state
                .messages()?
                .into_iter()
                .rev()
                .find(|m| m.role == Role::Assistant && !m.content().is_empty())
                .map(|m| m.content())
                .unwrap_or_default();
            println!("{}", reply);

            if let RunOutcome::Recovered(category) = report.outcome {
                log::warn!("Run recovered from a {} failure", category);
            }
            if !report.checkpointed {
                eprintln!("warning: session '{}' was not saved", session);
            }
        }
        Commands::Session { action } => match action {
            SessionAction::Show { id } => match engine.checkpoints().get(&id).await? {
                Some(checkpoint) => println!("{}", serde_json::to_string_pretty(&checkpoint)?),
                None => println!("No checkpoint for session '{}'", id),
            },
            SessionAction::Evict { id } => {
                if engine.checkpoints().evict(&id).await? {
                    println!("Evicted session '{}'", id);
                } else {
                    println!("No checkpoint for session '{}'", id);
                }
            }
        },
    }

    Ok(())
}
