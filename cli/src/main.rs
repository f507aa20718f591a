use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use combat_engine::api::{
    EncounterConfig, EncounterSummary, GameState, parse_game_state, simulate_encounter,
    simulate_encounter_from,
};
use combat_engine::content::{builtin_encounter_ids, builtin_encounters};
use encoding_rs::Encoding;

#[derive(Subcommand)]
enum Cmd {
    /// Autopilot an encounter and print the combat log
    Run {
        /// Built-in encounter id (see `list`)
        #[arg(long, conflicts_with = "file")]
        encounter: Option<String>,
        /// Encounter file (JSON, or YAML with a .yaml/.yml extension)
        #[arg(long)]
        file: Option<PathBuf>,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Safety cap on full rounds
        #[arg(long, default_value_t = 50)]
        max_rounds: u32,
        /// One-time effect sources already spent this session
        #[arg(long = "consumed", value_delimiter = ',')]
        consumed: Vec<String>,
        /// Print the full summary as JSON instead of the log
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Pretty-print a built-in encounter as JSON
    Show {
        #[arg(long)]
        encounter: String,
    },
    /// List built-in encounter ids
    List,
}

#[derive(Parser)]
#[command(name = "combat-cli")]
#[command(about = "Turn-based combat engine harness")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

fn read_text_auto(path: &Path) -> anyhow::Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn read_state_auto(path: &Path) -> anyhow::Result<GameState> {
    let text = read_text_auto(path)?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    parse_game_state(&text, yaml).with_context(|| format!("in {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Run {
            encounter,
            file,
            seed,
            max_rounds,
            consumed,
            json,
        } => {
            let cfg = EncounterConfig {
                encounter_id: encounter.clone(),
                seed,
                max_rounds,
                consumed_sources: consumed.into_iter().map(Into::into).collect(),
                ..EncounterConfig::default()
            };
            tracing::debug!(seed, max_rounds, "running encounter");
            let summary: EncounterSummary = match (&file, &encounter) {
                (Some(path), _) => {
                    let state = read_state_auto(path)?;
                    simulate_encounter_from(&state, &cfg)?
                }
                (None, Some(_)) => simulate_encounter(cfg)?,
                (None, None) => bail!("pass --encounter <id> or --file <path>"),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for line in &summary.log {
                    println!("{}", line);
                }
                let outcome = summary
                    .outcome
                    .map(|o| format!("{:?}", o).to_lowercase())
                    .unwrap_or_else(|| "none".to_string());
                println!(
                    "result={} turns={} used_sources=[{}]",
                    outcome,
                    summary.turns_elapsed,
                    summary
                        .used_sources
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                );
            }
        }
        Cmd::Show { encounter } => {
            let builtins = builtin_encounters();
            let text = builtins
                .get(encounter.as_str())
                .with_context(|| format!("unknown built-in encounter '{}'", encounter))?;
            let value: serde_json::Value = serde_json::from_str(text)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Cmd::List => {
            for id in builtin_encounter_ids() {
                println!("{}", id);
            }
        }
    }
    Ok(())
}
