use crate::Dice;
use crate::checks;
use crate::combat::Resolution;
use crate::combat::attack::{Strike, basic_attack};
use crate::conditions::apply_status;
use crate::error::ActionError;
use crate::life::{self, fraction_of};
use crate::model::{
    Combatant, CombatantId, DEFEND_STATUS, EffectKind, Skill, SkillEffect, SkillId, SkillTarget,
    Status, StatusKind, position,
};

/// Turns the defend stance lasts. It has to survive the defender's own
/// end-of-turn tick to cover the opponents' turns that follow.
pub const DEFEND_DURATION: u32 = 2;

/// A basic attack action, including a possible second strike from
/// `DOUBLE_ATTACK`. The double attack chance is rolled once per action; the
/// second strike sees the state left by the first.
pub fn attack_action<L: FnMut(String)>(
    roster: &mut [Combatant],
    attacker: usize,
    defender: usize,
    dice: &mut Dice,
    log: &mut L,
) -> Vec<Strike> {
    let double = roster[attacker]
        .effect(|k| matches!(k, EffectKind::DoubleAttack))
        .map(|e| e.chance.unwrap_or(e.value));
    let swings = match double {
        Some(p) if checks::chance(dice, p).passed => {
            log(format!("[DOUBLE][{}] strikes twice", roster[attacker].name));
            2
        }
        _ => 1,
    };

    let mut strikes = Vec::with_capacity(swings);
    for swing in 0..swings {
        if swing > 0 && (!roster[defender].is_alive() || !roster[attacker].is_alive()) {
            break;
        }
        strikes.push(basic_attack(roster, attacker, defender, dice, log));
    }
    strikes
}

/// Check that `caster` may cast `skill_id` right now.
pub fn validate_skill<'a>(caster: &'a Combatant, skill_id: &SkillId) -> Result<&'a Skill, ActionError> {
    let skill = caster
        .skill(skill_id)
        .ok_or_else(|| ActionError::UnknownSkill(skill_id.clone()))?;
    let turns = caster.cooldown(skill_id);
    if turns > 0 {
        return Err(ActionError::OnCooldown {
            skill: skill.name.clone(),
            turns,
        });
    }
    if caster.mp < skill.cost {
        return Err(ActionError::InsufficientMana {
            skill: skill.name.clone(),
            cost: skill.cost,
            available: caster.mp,
        });
    }
    Ok(skill)
}

/// Check that `target` is a living opponent of `roster[actor]`.
pub fn validate_target(
    roster: &[Combatant],
    actor: usize,
    target: &CombatantId,
) -> Result<usize, ActionError> {
    let idx = position(roster, target).ok_or_else(|| ActionError::UnknownCombatant(target.clone()))?;
    let t = &roster[idx];
    if !t.is_opponent_of(&roster[actor]) {
        return Err(ActionError::InvalidTarget(target.clone()));
    }
    if !t.is_alive() {
        return Err(ActionError::TargetDefeated(target.clone()));
    }
    Ok(idx)
}

/// Resolve the roster indices a skill affects.
pub fn skill_targets(
    roster: &[Combatant],
    caster: usize,
    skill: &Skill,
    chosen: Option<&CombatantId>,
) -> Result<Vec<usize>, ActionError> {
    match skill.target {
        SkillTarget::Caster => Ok(vec![caster]),
        SkillTarget::SingleEnemy => {
            let target = chosen.ok_or(ActionError::NoTarget)?;
            validate_target(roster, caster, target).map(|idx| vec![idx])
        }
        SkillTarget::AllEnemies => {
            let targets: Vec<usize> = roster
                .iter()
                .enumerate()
                .filter(|(_, c)| c.is_alive() && c.is_opponent_of(&roster[caster]))
                .map(|(i, _)| i)
                .collect();
            if targets.is_empty() {
                Err(ActionError::NoTarget)
            } else {
                Ok(targets)
            }
        }
    }
}

/// Cast an already validated skill: pay its cost, start its cooldown, then
/// apply every effect in order.
pub fn skill_action<L: FnMut(String)>(
    roster: &mut [Combatant],
    caster: usize,
    targets: &[usize],
    skill: &Skill,
    log: &mut L,
) {
    {
        let c = &mut roster[caster];
        life::spend_mana(c, skill.cost);
        // +1 because the caster's own end-of-turn tick follows immediately
        c.cooldowns.insert(skill.id.clone(), skill.cooldown.saturating_add(1));
        log(format!(
            "[SKILL][{}] casts {} (−{} MP)",
            c.name, skill.name, skill.cost
        ));
    }

    for effect in &skill.effects {
        match effect {
            SkillEffect::Damage { value } => {
                let raw = (f64::from(roster[caster].atk) * value).floor() as i32;
                for &t in targets {
                    if !roster[t].is_alive() {
                        continue;
                    }
                    let dmg = raw.saturating_sub(roster[t].mdef).max(1);
                    log(format!(
                        "[SKILL][{}] {} hits {} for {}",
                        roster[caster].name, skill.name, roster[t].name, dmg
                    ));
                    life::apply_damage(&mut roster[t], dmg, &mut *log);
                }
            }
            SkillEffect::Heal { value } => {
                let c = &mut roster[caster];
                let amount = fraction_of(c.max_hp, *value);
                life::heal(c, amount, &mut *log);
            }
            SkillEffect::ApplyStatus { status } => {
                for &t in targets {
                    if roster[t].is_alive() {
                        apply_status(&mut roster[t], status, &mut *log);
                    }
                }
            }
        }
    }
    tracing::debug!(caster = %roster[caster].id, skill = %skill.id, targets = targets.len(), "skill cast");
}

/// Take a defensive stance until the end of the actor's next turn.
pub fn defend<L: FnMut(String)>(roster: &mut [Combatant], actor: usize, log: &mut L) {
    let mut stance = Status::new(DEFEND_STATUS, DEFEND_DURATION, StatusKind::Good);
    stance.description = "Defense doubled until the next turn".to_string();
    log(format!("[DEFEND][{}] braces for impact", roster[actor].name));
    apply_status(&mut roster[actor], &stance, &mut *log);
}

fn pair(roster: &[Combatant], a: &CombatantId, b: &CombatantId) -> Result<(usize, usize), ActionError> {
    let ai = position(roster, a).ok_or_else(|| ActionError::UnknownCombatant(a.clone()))?;
    let bi = position(roster, b).ok_or_else(|| ActionError::UnknownCombatant(b.clone()))?;
    if ai == bi {
        return Err(ActionError::InvalidTarget(b.clone()));
    }
    Ok((ai, bi))
}

/// A single basic attack on a copy of the roster.
pub fn resolve_basic_attack(
    roster: &[Combatant],
    attacker: &CombatantId,
    defender: &CombatantId,
    dice: &mut Dice,
) -> Result<Resolution, ActionError> {
    let (a, d) = pair(roster, attacker, defender)?;
    let mut combatants = roster.to_vec();
    let mut logs = Vec::new();
    basic_attack(&mut combatants, a, d, dice, &mut |s| logs.push(s));
    Ok(Resolution { logs, combatants })
}

/// A full attack action (double attack included) on a copy of the roster.
pub fn execute_attack_action(
    roster: &[Combatant],
    attacker: &CombatantId,
    defender: &CombatantId,
    dice: &mut Dice,
) -> Result<Resolution, ActionError> {
    let (a, d) = pair(roster, attacker, defender)?;
    let mut combatants = roster.to_vec();
    let mut logs = Vec::new();
    attack_action(&mut combatants, a, d, dice, &mut |s| logs.push(s));
    Ok(Resolution { logs, combatants })
}

/// Validate and cast a skill on a copy of the roster. A rejected cast returns
/// the error and leaves nothing changed.
pub fn execute_skill_action(
    roster: &[Combatant],
    caster: &CombatantId,
    skill: &SkillId,
    target: Option<&CombatantId>,
) -> Result<Resolution, ActionError> {
    let c = position(roster, caster).ok_or_else(|| ActionError::UnknownCombatant(caster.clone()))?;
    let skill = validate_skill(&roster[c], skill)?.clone();
    let targets = skill_targets(roster, c, &skill, target)?;
    let mut combatants = roster.to_vec();
    let mut logs = Vec::new();
    skill_action(&mut combatants, c, &targets, &skill, &mut |s| logs.push(s));
    Ok(Resolution { logs, combatants })
}
