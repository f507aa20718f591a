use clap::Parser;
use combat_engine::api::{
    EncounterConfig, GameState, SimulationStats, parse_game_state, simulate_many,
    simulate_many_from,
};
use encoding_rs::Encoding;
use serde::Serialize;
use std::{fs, path::PathBuf};

#[derive(Parser)]
#[command(name = "simulate-vs")]
#[command(about = "Monte Carlo sim: many autopiloted runs of one encounter")]
struct Args {
    /// Encounter file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long, conflicts_with = "encounter")]
    file: Option<PathBuf>,

    /// Built-in encounter id
    #[arg(long)]
    encounter: Option<String>,

    /// Number of trials
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// Safety cap on rounds per trial
    #[arg(long, default_value_t = 50)]
    max_rounds: u32,

    /// RNG base seed (trial i uses seed+i)
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Print the results as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    encounter: &'a str,
    seed: u64,
    #[serde(flatten)]
    stats: &'a SimulationStats,
}

fn read_text_auto(path: &std::path::Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn read_state_auto(path: &std::path::Path) -> anyhow::Result<GameState> {
    let text = read_text_auto(path)?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    parse_game_state(&text, yaml)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let cfg = EncounterConfig {
        encounter_id: args.encounter.clone(),
        seed: args.seed,
        max_rounds: args.max_rounds,
        ..EncounterConfig::default()
    };

    let (stats, label) = match (&args.file, &args.encounter) {
        (Some(path), _) => {
            let state = read_state_auto(path)?;
            (
                simulate_many_from(&state, &cfg, args.trials)?,
                path.display().to_string(),
            )
        }
        (None, Some(id)) => (simulate_many(cfg.clone(), args.trials)?, id.clone()),
        (None, None) => anyhow::bail!("pass --file <path> or --encounter <id>"),
    };

    tracing::debug!(trials = args.trials, wins = stats.wins, "simulation finished");
    if args.json {
        let report = Report {
            encounter: &label,
            seed: args.seed,
            stats: &stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_stats(&label, &stats);
    }
    Ok(())
}

fn print_stats(label: &str, stats: &SimulationStats) {
    let pct = |n: u32| {
        if stats.samples == 0 {
            0.0
        } else {
            f64::from(n) / f64::from(stats.samples) * 100.0
        }
    };

    println!("simulate-vs results");
    println!("-------------------");
    println!("encounter:          {}", label);
    println!("trials:             {}", stats.samples);
    println!();
    println!("win rate:           {:.1}%", pct(stats.wins));
    println!("loss rate:          {:.1}%", pct(stats.losses));
    println!("stalemate rate:     {:.1}%", pct(stats.stalemates));
    println!("avg rounds:         {:.2}", stats.avg_turns);
    println!("median rounds:      {}", stats.median_turns);
}
