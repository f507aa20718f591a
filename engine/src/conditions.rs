use crate::life::{fraction_of, heal, restore_mana};
use crate::model::{Combatant, CombatantId, EffectKind, Status};

/// Add a status unless one with the same name is already active.
/// Returns true if the status was added.
pub fn apply_status(target: &mut Combatant, status: &Status, mut log: impl FnMut(String)) -> bool {
    if target.has_status(&status.name) {
        return false;
    }
    target.statuses.push(status.clone());
    log(format!(
        "[COND][{}] gains {} ({} turn(s))",
        target.name, status.name, status.duration
    ));
    true
}

/// Whether any of the target's immunities blocks this status name.
pub fn is_immune(target: &Combatant, name: &str) -> bool {
    target.effects.iter().any(|e| e.blocks_status(name))
}

/// On-hit application: immunity first, then the uniqueness rule.
pub fn apply_on_hit_status(
    target: &mut Combatant,
    status: &Status,
    mut log: impl FnMut(String),
) -> bool {
    if is_immune(target, &status.name) {
        log(format!(
            "[COND][{}] is immune to {}",
            target.name, status.name
        ));
        return false;
    }
    apply_status(target, status, log)
}

/// End-of-turn upkeep.
///
/// Heal/mana over time applies to every living combatant; status durations and
/// cooldowns only tick for the combatant that just acted.
pub fn end_of_turn(roster: &mut [Combatant], actor: &CombatantId, mut log: impl FnMut(String)) {
    for c in roster.iter_mut().filter(|c| c.is_alive()) {
        if c.hp < c.max_hp {
            if let Some(value) = c
                .effect(|k| matches!(k, EffectKind::HealOverTime))
                .map(|e| e.value)
            {
                let amount = fraction_of(c.max_hp, value);
                heal(c, amount, &mut log);
            }
        }
        if c.mp < c.max_mp {
            if let Some(value) = c
                .effect(|k| matches!(k, EffectKind::ManaOverTime))
                .map(|e| e.value)
            {
                let amount = fraction_of(c.max_mp, value);
                restore_mana(c, amount, &mut log);
            }
        }
    }

    let Some(c) = roster.iter_mut().find(|c| &c.id == actor) else {
        return;
    };
    tick_statuses(c, &mut log);
    for turns in c.cooldowns.values_mut() {
        *turns = turns.saturating_sub(1);
    }
}

/// Decrement every status duration by one and drop the expired ones.
pub fn tick_statuses(c: &mut Combatant, mut log: impl FnMut(String)) {
    for s in c.statuses.iter_mut() {
        s.duration = s.duration.saturating_sub(1);
    }
    let name = c.name.clone();
    c.statuses.retain(|s| {
        if s.duration == 0 {
            log(format!("[COND][{}] {} wears off", name, s.name));
            false
        } else {
            true
        }
    });
}
