use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_harness::hooks::{self, HookEvent, HookInput};
use agent_harness::mcp;
use agent_harness::models::{EntryType, FeatureStatus};
use agent_harness::project::Project;
use agent_harness::vcs::{CommitOutcome, Git};

#[derive(Parser)]
#[command(name = "harness")]
#[command(about = "Feature checklist and progress log for long-running coding agents")]
struct Cli {
    /// Project directory (defaults to $CLAUDE_WORKING_DIRECTORY, then the current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the checklist, progress log and init marker
    Init,
    /// Show feature counts, next priority and latest progress
    Status,
    /// Append an entry to the progress log
    Log {
        /// started, completed, checkpoint, note, or blocker
        entry_type: EntryType,
        message: String,
    },
    /// Print the progress log
    Progress {
        /// Only the most recent N entries
        #[arg(short, long)]
        tail: Option<usize>,
    },
    /// Manage the feature checklist
    Feature {
        #[command(subcommand)]
        command: FeatureCommand,
    },
    /// Log a checkpoint entry and commit all changes
    Checkpoint { message: String },
    /// Run a session hook (reads the host payload on stdin)
    Hook {
        #[command(subcommand)]
        event: HookCommand,
    },
    /// Start MCP server via stdio
    Mcp,
}

#[derive(Subcommand)]
enum FeatureCommand {
    /// Add a feature (starts as failing)
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Mark a feature in progress
    Start { id: u64 },
    /// Mark a feature passing
    Pass { id: u64 },
    /// Mark a feature failing
    Fail { id: u64 },
    /// List all features
    List,
    /// Show the feature to work on next
    Next,
}

#[derive(Subcommand)]
enum HookCommand {
    SessionStart,
    Stop,
    PreToolUse,
}

/// Initialize tracing with output to stderr (for hooks and MCP mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "agent_harness=info".into()),
    );

    if use_stderr {
        // Hook and MCP modes: stdout is the protocol channel
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn project_dir(dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = dir {
        return Ok(dir);
    }
    if let Ok(dir) = std::env::var("CLAUDE_WORKING_DIRECTORY") {
        return Ok(PathBuf::from(dir));
    }
    std::env::current_dir().context("Could not determine the current directory")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(cli.command, Commands::Mcp | Commands::Hook { .. });
    init_tracing(use_stderr);

    let root = project_dir(cli.dir)?;
    let project = Project::open(&root);
    let git = Git::new(&root);

    match cli.command {
        Commands::Init => {
            let report = project.init()?;
            if report.already_initialized && report.created.is_empty() {
                println!("Harness already initialized in {}", root.display());
            } else {
                println!("Initialized harness in {}", root.display());
                for file in &report.created {
                    println!("  created {}", file);
                }
            }
        }
        Commands::Status => {
            let status = project.summarizer().status();
            println!("{}", status.render());
            let upcoming = status.render_upcoming();
            if !upcoming.is_empty() {
                println!();
                print!("{}", upcoming);
            }
        }
        Commands::Log {
            entry_type,
            message,
        } => {
            let entry = project.progress().append(entry_type, &message)?;
            println!("{}", entry.to_line());
        }
        Commands::Progress { tail } => {
            let entries = match tail {
                Some(n) => project.progress().tail(n)?,
                None => project.progress().all()?,
            };
            if entries.is_empty() {
                println!("No progress logged yet");
            }
            for entry in entries {
                println!("{}", entry.to_line());
            }
        }
        Commands::Feature { command } => run_feature_command(&project, command)?,
        Commands::Checkpoint { message } => match project.checkpoint(&git, &message)? {
            CommitOutcome::Committed { hash } => {
                println!("Checkpoint {}: {}", hash, message.trim())
            }
            CommitOutcome::NothingToCommit => println!("Checkpoint logged; nothing to commit"),
        },
        Commands::Hook { event } => {
            let event = match event {
                HookCommand::SessionStart => HookEvent::SessionStart,
                HookCommand::Stop => HookEvent::Stop,
                HookCommand::PreToolUse => HookEvent::PreToolUse,
            };
            let mut raw = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
                tracing::debug!("Could not read hook input: {}", e);
            }
            let output = hooks::run(event, &project, &git, &HookInput::parse(&raw));
            println!("{}", output.to_json());
        }
        Commands::Mcp => {
            mcp::run_stdio_server(project, Arc::new(git)).await?;
        }
    }

    Ok(())
}

fn run_feature_command(project: &Project, command: FeatureCommand) -> anyhow::Result<()> {
    let features = project.features();
    match command {
        FeatureCommand::Add { name, description } => {
            let id = features.add(&name, &description)?;
            println!("Added feature #{}: {}", id, name.trim());
        }
        FeatureCommand::Start { id } => {
            let feature = project.set_feature_status(id, FeatureStatus::InProgress)?;
            println!("Started #{}: {}", feature.id, feature.name);
        }
        FeatureCommand::Pass { id } => {
            let feature = project.set_feature_status(id, FeatureStatus::Passing)?;
            println!("Passing #{}: {}", feature.id, feature.name);
        }
        FeatureCommand::Fail { id } => {
            let feature = project.set_feature_status(id, FeatureStatus::Failing)?;
            println!("Failing #{}: {}", feature.id, feature.name);
        }
        FeatureCommand::List => {
            let list = features.list()?;
            if list.is_empty() {
                println!("No features tracked yet");
            }
            for feature in list {
                println!("{} #{} {}", feature.status.label(), feature.id, feature.name);
            }
        }
        FeatureCommand::Next => match features.next_priority()? {
            Some(feature) => {
                println!("#{} {}", feature.id, feature.name);
                if !feature.description.is_empty() {
                    println!("{}", feature.description);
                }
            }
            None => println!("Nothing to do: all features passing"),
        },
    }
    Ok(())
}
