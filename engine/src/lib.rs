use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod api;
pub mod checks;
pub mod combat;
pub mod conditions;
pub mod content;
pub mod encounter;
pub mod error;
pub mod life;
pub mod model;

pub use encounter::{Encounter, EncounterEvent, Phase, PlayerAction, StepReport};
pub use error::{ActionError, EncounterError};
pub use model::{
    Combatant, CombatantId, CombatantKind, EffectKind, Skill, SkillEffect, SkillId, SkillTarget,
    SourceId, SpecialEffect, Status, StatusKind,
};

enum Source {
    Seeded(ChaCha8Rng),
    Scripted { rolls: Vec<f64>, cursor: usize },
}

/// Uniform `[0, 1)` draws for every probability check in combat.
///
/// Seeded dice are reproducible per seed; scripted dice replay a fixed
/// sequence (cycling when exhausted) so tests can force each branch.
pub struct Dice {
    source: Source,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: Source::Seeded(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// An empty script always yields `0.0`.
    pub fn from_scripted(rolls: Vec<f64>) -> Self {
        Self {
            source: Source::Scripted { rolls, cursor: 0 },
        }
    }

    /// Dice whose draws never pass a probability below one.
    pub fn never() -> Self {
        Self::from_scripted(vec![0.999_999])
    }

    pub fn roll(&mut self) -> f64 {
        match &mut self.source {
            Source::Seeded(rng) => rng.gen_range(0.0..1.0),
            Source::Scripted { rolls, cursor } => {
                if rolls.is_empty() {
                    return 0.0;
                }
                let value = rolls[*cursor % rolls.len()];
                *cursor += 1;
                value
            }
        }
    }
}
