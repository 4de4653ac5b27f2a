use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use shotweave_risk::{EngineConfig, ErrorResponse, InputError, ModelStore, RiskEngine};

#[derive(Parser, Debug)]
#[command(name = "shotweave", version, about = "Production risk engine operator CLI")]
struct Cli {
    /// Engine configuration (TOML). Built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Breaks a script down into locations, characters and shoot-day estimates.
    Breakdown {
        /// Script file; reads stdin when omitted.
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Scores budget-overrun risk from operational metrics.
    Risk {
        #[arg(long)]
        days_behind: Option<String>,
        #[arg(long)]
        cost_variance_pct: Option<String>,
        #[arg(long)]
        star_delay_factor: Option<String>,
        #[arg(long)]
        crew_efficiency: Option<String>,
    },
    /// Retrains the overrun model on the built-in table and overwrites the artifact.
    Train,
    /// Prints the persisted overrun model.
    Model,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::load_or_default(cli.config.as_deref())?;
    match cli.command {
        Commands::Breakdown { script } => {
            let text = read_script(script)?;
            let engine = RiskEngine::from_config(&config)?;
            let response = engine
                .breakdown_json(&json!({ "script": text }))
                .or_else(reject)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Risk {
            days_behind,
            cost_variance_pct,
            star_delay_factor,
            crew_efficiency,
        } => {
            let mut body = Map::new();
            for (field, value) in [
                ("days_behind", days_behind),
                ("cost_variance_pct", cost_variance_pct),
                ("star_delay_factor", star_delay_factor),
                ("crew_efficiency", crew_efficiency),
            ] {
                if let Some(value) = value {
                    body.insert(field.to_string(), Value::String(value));
                }
            }
            let engine = RiskEngine::from_config(&config)?;
            let response = engine.assess_json(&Value::Object(body)).or_else(reject)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Train => {
            let telemetry = config.telemetry()?;
            let store = ModelStore::new(&config.model_path, config.ridge_alpha);
            let trained = store
                .retrain_with_telemetry(Some(&telemetry))
                .with_context(|| format!("training model at {}", store.path().display()))?;
            println!("{}", serde_json::to_string_pretty(&trained.report)?);
            eprintln!("{}", trained.report.summary());
            Ok(())
        }
        Commands::Model => {
            let store = ModelStore::new(&config.model_path, config.ridge_alpha);
            match store.load()? {
                Some(model) => println!("{}", serde_json::to_string_pretty(&model)?),
                None => println!("no model persisted at {}", store.path().display()),
            }
            Ok(())
        }
    }
}

fn read_script(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(&path).with_context(|| format!("reading script {}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading script from stdin")?;
            Ok(text)
        }
    }
}

fn reject<T>(err: InputError) -> Result<T> {
    println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&err))?);
    bail!(err)
}
