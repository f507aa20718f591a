use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::Dice;
use crate::combat::outcome::{CombatResult, ConsumedEffects};
use crate::content::builtin_encounters;
use crate::encounter::{Encounter, EncounterEvent, StepReport};
use crate::error::EncounterError;
use crate::model::{Combatant, SourceId};

pub use crate::encounter::CombatEnd;

const DEFAULT_MAX_ROUNDS: u32 = 50;

/// Snapshot handed over by the surrounding game when a fight starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub combatants: Vec<Combatant>,
    #[serde(default)]
    pub is_in_combat: bool,
}

/// Per-session owner of one-time effect bookkeeping.
///
/// The session lends its consumed set to every encounter it starts and folds
/// back whatever the encounter spent, so a revival shield cannot be reused by
/// re-entering combat until [`CombatSession::reset_one_time_effects`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSession {
    consumed: ConsumedEffects,
}

impl CombatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_consumed(consumed: ConsumedEffects) -> Self {
        Self { consumed }
    }

    pub fn consumed(&self) -> &ConsumedEffects {
        &self.consumed
    }

    /// Start an encounter from a game state snapshot. The snapshot itself is
    /// never modified.
    pub fn begin(&self, state: &GameState, dice: Dice) -> Result<Encounter, EncounterError> {
        if !state.is_in_combat {
            return Err(EncounterError::NotInCombat);
        }
        Encounter::start(&state.combatants, self.consumed.clone(), dice)
    }

    /// Record one-time effects reported by a step as soon as they fire.
    pub fn observe(&mut self, report: &StepReport) {
        for event in &report.events {
            if let EncounterEvent::OneTimeEffectUsed(source) = event {
                self.consumed.insert(source.clone());
            }
        }
    }

    /// Take the final state of a finished encounter. Consuming the encounter
    /// means the hand-off happens exactly once.
    #[allow(clippy::result_large_err)]
    pub fn conclude(&mut self, encounter: Encounter) -> Result<CombatEnd, Encounter> {
        self.consumed.extend(encounter.consumed());
        encounter.conclude()
    }

    pub fn reset_one_time_effects(&mut self) {
        self.consumed.clear();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EncounterConfig {
    #[serde(default)]
    pub encounter_id: Option<String>,
    #[serde(default)]
    pub encounter_path: Option<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default)]
    pub consumed_sources: Vec<SourceId>,
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            encounter_id: None,
            encounter_path: None,
            seed: 0,
            max_rounds: DEFAULT_MAX_ROUNDS,
            consumed_sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EncounterSummary {
    /// `None` when the round cap was hit first.
    pub outcome: Option<CombatResult>,
    pub turns_elapsed: u32,
    pub combatants: Vec<Combatant>,
    pub used_sources: Vec<SourceId>,
    pub log: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SimulationStats {
    pub samples: u32,
    pub wins: u32,
    pub losses: u32,
    pub stalemates: u32,
    pub avg_turns: f64,
    pub median_turns: u32,
}

/// Decode a game state from JSON or YAML text.
pub fn parse_game_state(text: &str, yaml: bool) -> Result<GameState> {
    if yaml {
        serde_yaml::from_str(text).context("failed to parse encounter YAML")
    } else {
        serde_json::from_str(text).context("failed to parse encounter JSON")
    }
}

pub fn load_game_state_file(path: &str) -> Result<GameState> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read encounter file: {}", path))?;
    let yaml = matches!(
        Path::new(path).extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    parse_game_state(&text, yaml).with_context(|| format!("in encounter file: {}", path))
}

pub fn load_builtin_game_state(id: &str) -> Result<GameState> {
    let builtins = builtin_encounters();
    let text = builtins
        .get(id)
        .ok_or_else(|| anyhow!("unknown built-in encounter '{}'", id))?;
    parse_game_state(text, false).with_context(|| format!("in built-in encounter '{}'", id))
}

pub fn load_game_state(cfg: &EncounterConfig) -> Result<GameState> {
    match (&cfg.encounter_id, &cfg.encounter_path) {
        (Some(id), _) => load_builtin_game_state(id),
        (None, Some(path)) => load_game_state_file(path),
        (None, None) => bail!("either encounter_id or encounter_path is required"),
    }
}

/// Play one encounter with the decision policy on both sides.
pub fn simulate_encounter(cfg: EncounterConfig) -> Result<EncounterSummary> {
    let state = load_game_state(&cfg)?;
    run_encounter(&state, &cfg, cfg.seed)
}

/// Same as [`simulate_encounter`] for a state the caller already loaded.
pub fn simulate_encounter_from(state: &GameState, cfg: &EncounterConfig) -> Result<EncounterSummary> {
    run_encounter(state, cfg, cfg.seed)
}

fn run_encounter(state: &GameState, cfg: &EncounterConfig, seed: u64) -> Result<EncounterSummary> {
    let mut session =
        CombatSession::with_consumed(cfg.consumed_sources.iter().cloned().collect());
    let mut encounter = session.begin(state, Dice::from_seed(seed))?;
    let mut log: Vec<String> = encounter.log().lines().map(str::to_string).collect();
    let mut used_sources = Vec::new();

    while encounter.result().is_none() && encounter.turns_elapsed() < cfg.max_rounds {
        let report = encounter.autopilot_step()?;
        session.observe(&report);
        for event in &report.events {
            if let EncounterEvent::OneTimeEffectUsed(source) = event {
                used_sources.push(source.clone());
            }
        }
        log.extend(report.logs);
    }

    let turns_elapsed = encounter.turns_elapsed();
    let (outcome, combatants) = match session.conclude(encounter) {
        Ok(end) => (Some(end.result), end.combatants),
        Err(unfinished) => {
            log.push(format!(
                "[END] no result after {} round(s)",
                unfinished.turns_elapsed()
            ));
            (None, unfinished.combatants().to_vec())
        }
    };

    Ok(EncounterSummary {
        outcome,
        turns_elapsed,
        combatants,
        used_sources,
        log,
    })
}

/// Run `samples` encounters with seeds `seed, seed + 1, ...`.
pub fn simulate_many(cfg: EncounterConfig, samples: u32) -> Result<SimulationStats> {
    let state = load_game_state(&cfg)?;
    simulate_many_from(&state, &cfg, samples)
}

/// Same as [`simulate_many`] for a state the caller already loaded.
/// `encounter_id` and `encounter_path` are ignored.
pub fn simulate_many_from(
    state: &GameState,
    cfg: &EncounterConfig,
    samples: u32,
) -> Result<SimulationStats> {
    let mut wins = 0;
    let mut losses = 0;
    let mut stalemates = 0;
    let mut turns = Vec::with_capacity(samples as usize);

    for i in 0..samples {
        let summary = run_encounter(state, cfg, cfg.seed.wrapping_add(u64::from(i)))?;
        match summary.outcome {
            Some(CombatResult::Win) => wins += 1,
            Some(CombatResult::Loss) => losses += 1,
            Some(CombatResult::Flee) | None => stalemates += 1,
        }
        turns.push(summary.turns_elapsed);
    }

    turns.sort_unstable();
    let avg_turns = if turns.is_empty() {
        0.0
    } else {
        turns.iter().map(|&t| f64::from(t)).sum::<f64>() / turns.len() as f64
    };
    let median_turns = if turns.is_empty() {
        0
    } else {
        let m = turns.len() / 2;
        if turns.len() % 2 == 1 {
            turns[m]
        } else {
            (turns[m - 1] + turns[m]) / 2
        }
    };

    Ok(SimulationStats {
        samples,
        wins,
        losses,
        stalemates,
        avg_turns,
        median_turns,
    })
}
