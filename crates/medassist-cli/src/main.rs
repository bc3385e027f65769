//! MedAssist CLI — run patient cases from the terminal.
//!
//! Reuses the same engine (medassist-core) and server bootstrap
//! (medassist-server) that power the HTTP API.

use clap::{Parser, Subcommand};
use medassist_cli::commands;

/// MedAssist — emergency-assistance case simulation
#[derive(Parser)]
#[command(name = "medassist", version, about = "MedAssist — emergency-assistance case simulation")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the workflow for one patient and write the case artifacts
    Run {
        /// Patient identifier (case-insensitive), e.g. "anne"
        patient: String,
        /// Root directory for run workspaces
        #[arg(long, env = "MEDASSIST_OUTPUT_DIR")]
        output_dir: Option<String>,
        /// Workflow YAML to run instead of the built-in chain
        #[arg(long, env = "MEDASSIST_WORKFLOW")]
        workflow: Option<String>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List known patients
    Patients,

    /// Inspect workflow definitions
    Workflow {
        #[command(subcommand)]
        action: WorkflowAction,
    },

    /// Start the MedAssist HTTP server
    Server {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3210)]
        port: u16,
        /// Root directory for run workspaces
        #[arg(long)]
        output_dir: Option<String>,
        /// Workflow YAML to serve instead of the built-in chain
        #[arg(long)]
        workflow: Option<String>,
        /// Build knowledge indices lazily on the first request
        #[arg(long)]
        no_warm_up: bool,
    },
}

#[derive(Subcommand)]
enum WorkflowAction {
    /// Print a workflow (the built-in chain unless --file is given)
    Show {
        /// Path to a workflow YAML file
        #[arg(long)]
        file: Option<String>,
    },
    /// Validate a workflow YAML file without running it
    Validate {
        /// Path to the workflow YAML file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "medassist_core=info,medassist_server=info,medassist_cli=info".into()
            }),
        )
        .init();

    let result = match cli.command {
        Commands::Run {
            patient,
            output_dir,
            workflow,
            json,
        } => {
            commands::run::run(
                &patient,
                output_dir.as_deref(),
                workflow.as_deref(),
                json,
            )
            .await
        }

        Commands::Patients => commands::patients::list(),

        Commands::Workflow { action } => match action {
            WorkflowAction::Show { file } => commands::workflow::show(file.as_deref()),
            WorkflowAction::Validate { file } => commands::workflow::validate(&file),
        },

        Commands::Server {
            host,
            port,
            output_dir,
            workflow,
            no_warm_up,
        } => commands::server::run(host, port, output_dir, workflow, !no_warm_up).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
