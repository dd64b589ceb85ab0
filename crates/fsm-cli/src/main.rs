//! fsmctl - authoring tools for state machine definitions.
//!
//! - `fsmctl check <file>` - validate a definition and print lints
//! - `fsmctl graph <file>` - print the state graph as Graphviz DOT
//! - `fsmctl simulate <file> --script <script>` - run scripted parameter writes and ticks

mod dot;
mod script;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use fsm_core::{Definition, DefinitionConfig};
use fsm_events::ChannelRegistry;

use crate::script::Script;

#[derive(Parser)]
#[command(name = "fsmctl")]
#[command(about = "Validate, graph and simulate state machine definitions", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a definition, then print its lints
    Check {
        /// Definition file (.yaml or .json)
        file: PathBuf,

        /// Fail on unreachable states and shadowed transitions
        #[arg(long)]
        deny_warnings: bool,
    },

    /// Print the state graph as Graphviz DOT
    Graph {
        file: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a scripted sequence of parameter writes and ticks
    Simulate {
        file: PathBuf,

        /// Script file (YAML)
        #[arg(short, long)]
        script: PathBuf,

        /// Also write the instance trace as JSON
        #[arg(long)]
        trace_json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    let logs = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        logs.json().init();
    } else {
        logs.init();
    }

    match cli.command {
        Commands::Check {
            file,
            deny_warnings,
        } => check(&file, deny_warnings),
        Commands::Graph { file, output } => graph(&file, output.as_deref()),
        Commands::Simulate {
            file,
            script,
            trace_json,
        } => simulate(&file, &script, trace_json.as_deref()),
    }
}

fn load_definition(path: &Path) -> Result<Definition> {
    let config = DefinitionConfig::load(path)
        .with_context(|| format!("Failed to load definition from {}", path.display()))?;
    let mut channels = ChannelRegistry::new();
    let definition = config
        .build(&mut channels)
        .with_context(|| format!("Invalid definition in {}", path.display()))?;
    tracing::debug!(
        definition = %definition.name(),
        channels = channels.len(),
        "definition loaded"
    );
    Ok(definition)
}

fn check(path: &Path, deny_warnings: bool) -> Result<()> {
    let definition = load_definition(path)?;
    println!(
        "{}: {} states, {} parameters, {} transitions",
        definition.name(),
        definition.state_count(),
        definition.params().len(),
        definition.transitions().len()
    );

    let lints = definition.lints();
    for lint in &lints {
        let level = if lint.is_suspicious() { "warning" } else { "note" };
        println!("{level}: {lint}");
    }

    let suspicious = lints.iter().filter(|l| l.is_suspicious()).count();
    if deny_warnings && suspicious > 0 {
        bail!("{suspicious} warning(s) in {}", path.display());
    }
    Ok(())
}

fn graph(path: &Path, output: Option<&Path>) -> Result<()> {
    let definition = load_definition(path)?;
    let rendered = dot::render(&definition);
    match output {
        Some(out) => std::fs::write(out, rendered)
            .with_context(|| format!("Failed to write {}", out.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

fn simulate(path: &Path, script_path: &Path, trace_json: Option<&Path>) -> Result<()> {
    let definition = Rc::new(load_definition(path)?);
    let script = Script::load(script_path)?;

    let sim = script::simulate(definition, &script)?;
    for line in &sim.lines {
        println!("{line}");
    }
    println!("final state: {}", sim.final_state);

    if let Some(out) = trace_json {
        let json = serde_json::to_string_pretty(&sim.trace.snapshot())?;
        std::fs::write(out, json).with_context(|| format!("Failed to write {}", out.display()))?;
    }
    Ok(())
}
