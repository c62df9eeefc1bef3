use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tributary_config::{EntryBinding, FailurePolicy, GraphDef, TriggerMode};
use tributary_engine::{ChannelSink, Engine, EngineConfig, ExecutionEvent};
use tributary_graph::{ValidatedGraph, build, validate};

/// Tributary - a dataflow graph engine
#[derive(Parser)]
#[command(name = "tributary")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// List the built-in node types and their port schemas as JSON
  Nodes,

  /// Validate a graph file and print its diagnostics
  Validate {
    /// Path to the graph file (JSON)
    graph_file: PathBuf,

    /// Seed an input at run start, e.g. `sum.a=5` (repeatable)
    #[arg(long = "bind", value_name = "INSTANCE.INPUT=VALUE")]
    entries: Vec<EntryBinding>,
  },

  /// Run a graph, printing execution events on stdout
  Run {
    /// Path to the graph file (JSON)
    graph_file: PathBuf,

    /// Seed an input at run start, e.g. `sum.a=5` (repeatable)
    #[arg(long = "bind", value_name = "INSTANCE.INPUT=VALUE")]
    entries: Vec<EntryBinding>,

    /// How events are printed
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Whether triggers re-arm after each firing
    #[arg(long, value_enum, default_value_t = ModeArg::Repeat)]
    trigger_mode: ModeArg,

    /// What happens to the rest of the run when a node fails
    #[arg(long, value_enum, default_value_t = PolicyArg::FailFast)]
    failure_policy: PolicyArg,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
  Repeat,
  Once,
}

impl From<ModeArg> for TriggerMode {
  fn from(arg: ModeArg) -> Self {
    match arg {
      ModeArg::Repeat => TriggerMode::Repeat,
      ModeArg::Once => TriggerMode::Once,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
  /// One JSON object per line
  Json,
  /// Colored, human-readable lines
  Pretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
  FailFast,
  Isolate,
}

impl From<PolicyArg> for FailurePolicy {
  fn from(arg: PolicyArg) -> Self {
    match arg {
      PolicyArg::FailFast => FailurePolicy::FailFast,
      PolicyArg::Isolate => FailurePolicy::Isolate,
    }
  }
}

fn main() -> Result<()> {
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Nodes) => list_nodes(),
    Some(Commands::Validate {
      graph_file,
      entries,
    }) => validate_graph(&graph_file, &entries),
    Some(Commands::Run {
      graph_file,
      entries,
      format,
      trigger_mode,
      failure_policy,
    }) => {
      let config = EngineConfig {
        trigger_mode: trigger_mode.into(),
        failure_policy: failure_policy.into(),
      };
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { run_graph(&graph_file, &entries, config, format).await })
    }
    None => {
      println!("tributary - use --help to see available commands");
      Ok(())
    }
  }
}

fn list_nodes() -> Result<()> {
  let catalog = tributary_nodes::builtin_catalog().context("failed to register built-in nodes")?;

  let types: Vec<Value> = catalog
    .iter()
    .map(|t| json!({ "name": t.name(), "schema": t.schema() }))
    .collect();
  println!("{}", serde_json::to_string_pretty(&types)?);

  Ok(())
}

/// Load a graph file, appending `entries` after the file's own bindings.
fn load_graph(graph_file: &Path, entries: &[EntryBinding]) -> Result<tributary_graph::Graph> {
  let content = std::fs::read_to_string(graph_file)
    .with_context(|| format!("failed to read graph file: {}", graph_file.display()))?;

  let mut def = GraphDef::from_json(&content)
    .with_context(|| format!("failed to parse graph file: {}", graph_file.display()))?;
  def.entries.extend(entries.iter().cloned());

  let catalog = tributary_nodes::builtin_catalog().context("failed to register built-in nodes")?;
  build(&catalog, &def).context("failed to build graph")
}

fn validate_graph(graph_file: &Path, entries: &[EntryBinding]) -> Result<()> {
  let graph = load_graph(graph_file, entries)?;
  let report = validate(&graph);

  println!("{}", serde_json::to_string_pretty(&report)?);
  for diagnostic in report.diagnostics() {
    let level = if diagnostic.is_error() { "error" } else { "warning" };
    eprintln!("{}: {}", level, diagnostic);
  }

  if !report.is_valid() {
    bail!("graph has {} error(s)", report.error_count());
  }
  eprintln!("Graph is valid: {} instance(s)", graph.len());

  Ok(())
}

async fn run_graph(
  graph_file: &Path,
  entries: &[EntryBinding],
  config: EngineConfig,
  format: Format,
) -> Result<()> {
  let graph: ValidatedGraph = load_graph(graph_file, entries)?
    .into_validated()
    .context("refusing to run an invalid graph")?;

  let (sink, mut events) = ChannelSink::channel();
  let engine = Engine::with_sink(config, sink);
  let cancel = CancellationToken::new();
  let handle = engine.start_with_cancel(graph, cancel.clone());
  info!(run_id = %handle.run_id(), "run started");

  let mut stdin = BufReader::new(tokio::io::stdin()).lines();
  let mut stdin_open = true;
  // Triggers announced but not yet answered, oldest first.
  let mut waiting: VecDeque<String> = VecDeque::new();

  loop {
    tokio::select! {
      event = events.recv() => {
        let Some(event) = event else { break };
        match format {
          Format::Json => println!("{}", serde_json::to_string(&event)?),
          Format::Pretty => println!("{}", render_pretty(&event)),
        }

        if let ExecutionEvent::InputNeeded { instance_id, input, port_type, .. } = &event {
          eprint!("{} ({}: {})> ", instance_id, input, port_type);
          waiting.push_back(instance_id.clone());
        }
        if event.is_terminal() {
          break;
        }
      }

      line = stdin.next_line(), if stdin_open && !waiting.is_empty() => {
        match line.context("failed to read from stdin")? {
          Some(line) => {
            let Some(instance_id) = waiting.pop_front() else { continue };
            if let Err(e) = handle.resolve_trigger(&instance_id, parse_line(&line)) {
              warn!(instance_id = %instance_id, error = %e, "could not resolve trigger");
            }
          }
          None => {
            stdin_open = false;
            info!("stdin closed, stopping run");
            handle.stop();
          }
        }
      }

      _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
        eprintln!();
        info!("interrupted, stopping run");
        cancel.cancel();
      }
    }
  }

  let summary = handle.wait().await.context("run failed")?;
  eprintln!(
    "Run {} {}: {} firing(s)",
    summary.run_id,
    if summary.stopped { "stopped" } else { "completed" },
    summary.firings.values().sum::<usize>()
  );
  if !summary.leftover.is_empty() {
    eprintln!("Unconsumed values: {}", serde_json::to_string(&summary.leftover)?);
  }

  Ok(())
}

fn display(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// One console line per event.
fn render_pretty(event: &ExecutionEvent) -> String {
  match event {
    ExecutionEvent::RunStarted { run_id } => format!("{} {}", "▶ RUN".cyan().bold(), run_id),
    ExecutionEvent::NodeStart { instance_id, .. } => {
      format!("{} {}", "▶ START".blue(), instance_id)
    }
    ExecutionEvent::NodeOutput {
      instance_id,
      port,
      value,
      ..
    } => format!("  {} {}.{}: {}", "EVENT".dimmed(), instance_id, port, display(value)),
    ExecutionEvent::NodeDone { instance_id, .. } => {
      format!("{} {}", "✓ DONE".green(), instance_id)
    }
    ExecutionEvent::NodeError {
      instance_id, error, ..
    } => format!("{} {}: {}", "✗ ERROR".red(), instance_id, error),
    ExecutionEvent::InputNeeded {
      instance_id,
      input,
      port_type,
      ..
    } => format!("{} {}.{} ({})", "? INPUT".yellow(), instance_id, input, port_type),
    ExecutionEvent::Log {
      instance_id,
      message,
      ..
    } => format!("  {} {}: {}", "LOG".magenta(), instance_id, message),
    ExecutionEvent::RunComplete { run_id } => {
      format!("{} {}", "✓ RUN COMPLETE".green().bold(), run_id)
    }
    ExecutionEvent::RunError { run_id, error } => {
      format!("{} {}: {}", "✗ RUN ERROR".red().bold(), run_id, error)
    }
    ExecutionEvent::RunStopped { run_id } => {
      format!("{} {}", "■ RUN STOPPED".yellow().bold(), run_id)
    }
  }
}

/// A typed line is JSON when it parses as JSON, otherwise a plain string.
fn parse_line(line: &str) -> Value {
  let line = line.trim();
  serde_json::from_str(line).unwrap_or_else(|_| Value::String(line.to_string()))
}
