use serde::{Deserialize, Serialize};

use crate::life::fraction_of;
use crate::model::{Combatant, CombatantId, CombatantKind};

/// Every this many completed rounds, NPCs regain mana.
pub const NPC_MANA_REGEN_ROUNDS: u32 = 3;
pub const NPC_MANA_REGEN_RATIO: f64 = 0.3;

/// Initiative: ids sorted by agility, highest first. Ties keep roster order.
pub fn initiative_order(roster: &[Combatant]) -> Vec<CombatantId> {
    let mut ranked: Vec<&Combatant> = roster.iter().collect();
    ranked.sort_by(|a, b| b.agi.cmp(&a.agi));
    ranked.into_iter().map(|c| c.id.clone()).collect()
}

/// Next slot after `current` in an order of `len` slots, and whether the
/// pointer wrapped back to the first slot.
pub fn next_index(len: usize, current: usize) -> (usize, bool) {
    if len == 0 {
        return (0, false);
    }
    let next = (current + 1) % len;
    (next, next == 0)
}

/// Fixed turn order with a circular pointer and a completed-round counter.
///
/// Defeated combatants keep their slot; callers skip them, so a revived
/// combatant acts again from its original position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOrder {
    order: Vec<CombatantId>,
    current_turn_index: usize,
    turns_elapsed: u32,
}

impl TurnOrder {
    pub fn initialize(roster: &[Combatant]) -> Self {
        Self {
            order: initiative_order(roster),
            current_turn_index: 0,
            turns_elapsed: 0,
        }
    }

    pub fn ids(&self) -> &[CombatantId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_turn_index
    }

    pub fn current(&self) -> Option<&CombatantId> {
        self.order.get(self.current_turn_index)
    }

    pub fn turns_elapsed(&self) -> u32 {
        self.turns_elapsed
    }

    /// Move to the next slot. Returns true when this completed a round.
    pub fn advance(&mut self) -> bool {
        let (next, wrapped) = next_index(self.order.len(), self.current_turn_index);
        self.current_turn_index = next;
        if wrapped {
            self.turns_elapsed += 1;
        }
        wrapped
    }
}

/// Periodic NPC mana regeneration, keyed purely off the round counter.
/// Silent: nothing goes to the combat log. Returns how many NPCs gained mana.
pub fn round_completed(roster: &mut [Combatant], turns_elapsed: u32) -> usize {
    if turns_elapsed == 0 || turns_elapsed % NPC_MANA_REGEN_ROUNDS != 0 {
        return 0;
    }
    let mut refreshed = 0;
    for c in roster
        .iter_mut()
        .filter(|c| c.kind == CombatantKind::Enemy && c.is_alive())
    {
        let before = c.mp;
        c.mp = c.mp
            .saturating_add(fraction_of(c.max_mp, NPC_MANA_REGEN_RATIO))
            .min(c.max_mp);
        if c.mp > before {
            refreshed += 1;
        }
    }
    tracing::debug!(turns_elapsed, refreshed, "npc mana regeneration");
    refreshed
}
