use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::life::fraction_of;
use crate::model::{Combatant, CombatantKind, EffectKind, SourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatResult {
    Win,
    Loss,
    Flee,
}

/// One-time-use effects already spent in this game session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumedEffects(IndexSet<SourceId>);

impl ConsumedEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, source: &SourceId) -> bool {
        self.0.contains(source)
    }

    /// Returns false if the source was already consumed.
    pub fn insert(&mut self, source: SourceId) -> bool {
        self.0.insert(source)
    }

    pub fn extend(&mut self, other: &ConsumedEffects) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<SourceId> for ConsumedEffects {
    fn from_iter<I: IntoIterator<Item = SourceId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What the termination check found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ongoing,
    /// The player would have fallen but a one-time revival shield fired.
    Revived(SourceId),
    Concluded(CombatResult),
}

/// Loss/win test run after every roster mutation.
///
/// A fallen player is first saved by an unused `OVERHEAL_SHIELD` (hp 1 plus a
/// shield worth `value` of max hp); its source is recorded in `consumed`.
pub fn check(
    roster: &mut [Combatant],
    consumed: &mut ConsumedEffects,
    mut log: impl FnMut(String),
) -> Verdict {
    let Some(player) = roster.iter_mut().find(|c| c.is_player()) else {
        tracing::error!("termination check ran without a player combatant");
        return Verdict::Concluded(CombatResult::Loss);
    };

    if player.hp <= 0 {
        let revival = player
            .effects
            .iter()
            .filter(|e| matches!(e.kind, EffectKind::OverhealShield))
            .find_map(|e| {
                let source = e.source_id.as_ref()?;
                (!consumed.contains(source)).then(|| (source.clone(), e.value))
            });
        let Some((source, value)) = revival else {
            log(format!("[STATE][{}] has fallen", player.name));
            return Verdict::Concluded(CombatResult::Loss);
        };
        consumed.insert(source.clone());
        player.hp = 1;
        player.shield = fraction_of(player.max_hp, value);
        log(format!(
            "[REVIVE][{}] {} flares: back at 1 HP with a {} point shield",
            player.name, source, player.shield
        ));
        tracing::debug!(%source, shield = player.shield, "one-time revival consumed");
        return Verdict::Revived(source);
    }

    let enemies_down = roster
        .iter()
        .filter(|c| c.kind == CombatantKind::Enemy)
        .all(|c| c.hp <= 0);
    if enemies_down {
        return Verdict::Concluded(CombatResult::Win);
    }
    Verdict::Ongoing
}
