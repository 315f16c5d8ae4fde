use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use codesync_common::perf;
use codesync_common::telemetry::{self, TelemetryConfig};
use codesync_common::{ClientId, CodesyncError, ExecutionSignal, FileId, FileStore, SyncConfig};
use codesync_core::{LocalSurface, Operation, apply, diff};
use codesync_session::{
    AllowAll, ConnectionId, LoopbackAuthority, SessionHandle, SessionOutput, SessionReactor,
};
use miette::{IntoDiagnostic, Result};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(version, about = "codesync - realtime text synchronization toolkit", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to config file (.toml or .json)
    #[arg(long, global = true, env = "CODESYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the operation turning OLD into NEW as JSON
    Diff { old: String, new: String },
    /// Apply a JSON operation to TEXT and print the result
    Apply {
        text: String,
        /// e.g. '[{"retain":5},{"insert":"!"}]'
        operation: String,
    },
    /// Run two simulated clients against an in-memory authority
    Demo {
        /// Initial document content
        #[arg(long, default_value = "")]
        initial: String,

        /// Successive document states, typed alternately by client A and B
        edits: Vec<String>,
    },
    /// Show the effective configuration
    Config {
        /// Save it to the config file
        #[arg(long)]
        write: bool,
    },
}

const DEMO_FILE: &str = "demo.txt";
/// How long the demo waits for more traffic before treating the sessions as settled.
const SETTLE: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    let store = FileStore::new(cli.config.unwrap_or_else(default_config_path));
    let config = SyncConfig::load_or_default(&store).await?;
    telemetry::init(
        TelemetryConfig::from_env("codesync-cli").with_filter(config.log_filter.clone()),
    );

    match cli.command {
        Commands::Diff { old, new } => {
            let op = perf::measure("diff", || diff(&old, &new));
            println!("{}", serde_json::to_string(&op).map_err(CodesyncError::from)?);
        }
        Commands::Apply { text, operation } => {
            let op: Operation = serde_json::from_str(&operation).map_err(CodesyncError::from)?;
            let result = apply(&text, &op).map_err(CodesyncError::from)?;
            println!("{result}");
        }
        Commands::Demo { initial, edits } => {
            run_demo(&config, initial, edits).await?;
        }
        Commands::Config { write } => {
            println!("{}", serde_json::to_string_pretty(&config).into_diagnostic()?);
            if write {
                config.save(&store).await?;
                println!("Saved to: {}", store.path().display());
            }
        }
    }

    Ok(())
}

struct DemoClient {
    name: &'static str,
    conn: ConnectionId,
    handle: SessionHandle,
    outputs: mpsc::Receiver<SessionOutput>,
    text: String,
}

async fn run_demo(config: &SyncConfig, initial: String, edits: Vec<String>) -> Result<()> {
    let signal = ExecutionSignal::global();
    let _running = signal.begin();
    tracing::debug!(running = signal.is_running(), "demo started");

    let edits = if edits.is_empty() {
        vec![
            "hello".to_owned(),
            "hello world".to_owned(),
            "Hello world".to_owned(),
            "Hello, world!".to_owned(),
        ]
    } else {
        edits
    };

    let mut authority = LoopbackAuthority::new().with_file(DEMO_FILE, initial);
    let mut clients = [
        spawn_client("A", &mut authority, config),
        spawn_client("B", &mut authority, config),
    ];
    for client in &clients {
        client.handle.open(DEMO_FILE).await?;
    }
    pump(&mut authority, &mut clients).await?;

    for (i, text) in edits.into_iter().enumerate() {
        let client = &mut clients[i % 2];
        println!("{} types {:?}", client.name, text);
        client.handle.local_edit(text.clone()).await?;
        client.text = text;
        pump(&mut authority, &mut clients).await?;
    }

    let file_id = FileId::from(DEMO_FILE);
    let authoritative = authority.content(&file_id).unwrap_or_default();
    for client in &clients {
        println!("{}: {:?}", client.name, client.text);
    }
    if clients.iter().any(|client| client.text != authoritative) {
        return Err(miette::miette!(
            "clients diverged from the authority ({authoritative:?})"
        ));
    }
    println!(
        "Converged at version {}: {:?}",
        authority.version(&file_id).unwrap_or_default(),
        authoritative
    );
    Ok(())
}

fn spawn_client(
    name: &'static str,
    authority: &mut LoopbackAuthority,
    config: &SyncConfig,
) -> DemoClient {
    let conn = authority.connect();
    let (handle, outputs) = SessionReactor::spawn(
        ClientId::generate(),
        LocalSurface::with_text(""),
        AllowAll,
        config.channel_capacity,
    );
    DemoClient {
        name,
        conn,
        handle,
        outputs,
        text: String::new(),
    }
}

/// Route reactor output through the authority until the sessions go quiet.
async fn pump(authority: &mut LoopbackAuthority, clients: &mut [DemoClient; 2]) -> Result<()> {
    loop {
        let [a, b] = &mut *clients;
        let next = tokio::time::timeout(SETTLE, async {
            tokio::select! {
                output = a.outputs.recv() => (0, output),
                output = b.outputs.recv() => (1, output),
            }
        })
        .await;
        let Ok((idx, output)) = next else {
            return Ok(());
        };
        let Some(output) = output else {
            return Err(miette::miette!(
                "session for client {} stopped",
                clients[idx].name
            ));
        };

        match output {
            SessionOutput::Send(message) => {
                for delivery in authority.handle(clients[idx].conn, message) {
                    if let Some(target) = clients.iter().find(|c| c.conn == delivery.to) {
                        target.handle.deliver(delivery.message).await?;
                    }
                }
            }
            SessionOutput::Content(text) => {
                tracing::info!(client = clients[idx].name, %text, "remote change");
                clients[idx].text = text;
            }
            SessionOutput::Status(status) => {
                tracing::info!(client = clients[idx].name, ?status, "status");
            }
            SessionOutput::Rejected(error) => return Err(error.into()),
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codesync")
        .join("config.toml")
}

fn init_miette() {
    let installed = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    if installed.is_ok() {
        miette::set_panic_hook();
    }
}
