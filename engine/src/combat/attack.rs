//! The basic attack pipeline.
//!
//! A strike runs through [`ATTACK_PIPELINE`] in order. Each stage reads and
//! updates a [`Strike`]; the evasion stage can stop the pipeline early.

use std::ops::ControlFlow;

use crate::checks;
use crate::conditions::{apply_on_hit_status, apply_status};
use crate::life::{self, DamageTaken, fraction_of};
use crate::model::{Combatant, DEFEND_STATUS, EffectKind};
use crate::Dice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackStage {
    Evasion,
    Berserker,
    Defense,
    BaseDamage,
    Critical,
    Reduction,
    Shield,
    AttackerOnHit,
    Retaliation,
}

pub const ATTACK_PIPELINE: [AttackStage; 9] = [
    AttackStage::Evasion,
    AttackStage::Berserker,
    AttackStage::Defense,
    AttackStage::BaseDamage,
    AttackStage::Critical,
    AttackStage::Reduction,
    AttackStage::Shield,
    AttackStage::AttackerOnHit,
    AttackStage::Retaliation,
];

/// Running values of one strike.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Strike {
    pub evaded: bool,
    pub attack: f64,
    pub defense: f64,
    /// Damage before shield absorption; never below 1 once computed.
    pub damage: i32,
    pub crit: bool,
    pub taken: DamageTaken,
    /// Stages that actually ran, in order.
    pub stages: Vec<AttackStage>,
}

/// Floor a damage value, keeping the minimum of 1.
pub fn floor_damage(raw: f64) -> i32 {
    if raw.is_nan() || raw < 1.0 {
        return 1;
    }
    if raw >= f64::from(i32::MAX) {
        return i32::MAX;
    }
    (raw.floor() as i32).max(1)
}

/// Resolve one basic attack of `roster[attacker]` against `roster[defender]`.
pub fn basic_attack<L: FnMut(String)>(
    roster: &mut [Combatant],
    attacker: usize,
    defender: usize,
    dice: &mut Dice,
    log: &mut L,
) -> Strike {
    let mut strike = Strike::default();
    for stage in ATTACK_PIPELINE {
        strike.stages.push(stage);
        let flow = run_stage(stage, roster, attacker, defender, dice, &mut strike, log);
        tracing::trace!(?stage, attack = strike.attack, defense = strike.defense, damage = strike.damage);
        if flow.is_break() {
            break;
        }
    }
    tracing::debug!(
        attacker = %roster[attacker].id,
        defender = %roster[defender].id,
        damage = strike.damage,
        crit = strike.crit,
        evaded = strike.evaded,
        "basic attack resolved"
    );
    strike
}

fn run_stage<L: FnMut(String)>(
    stage: AttackStage,
    roster: &mut [Combatant],
    attacker: usize,
    defender: usize,
    dice: &mut Dice,
    strike: &mut Strike,
    log: &mut L,
) -> ControlFlow<()> {
    match stage {
        AttackStage::Evasion => {
            let def = &roster[defender];
            if let Some(e) = def.effect(|k| matches!(k, EffectKind::Evasion)) {
                if checks::chance(dice, e.value).passed {
                    strike.evaded = true;
                    log(format!(
                        "[ATTACK][{}] misses: {} evades",
                        roster[attacker].name, def.name
                    ));
                    return ControlFlow::Break(());
                }
            }
        }
        AttackStage::Berserker => {
            let atk = &roster[attacker];
            strike.attack = f64::from(atk.atk);
            if let Some(e) = atk.effect(|k| matches!(k, EffectKind::BerserkerRage)) {
                if atk.hp < atk.max_hp {
                    let bonus_pct = (1.0 - atk.hp_ratio()) * 100.0 * e.value;
                    strike.attack *= 1.0 + bonus_pct / 100.0;
                    log(format!("[RAGE][{}] +{:.0}% ATK", atk.name, bonus_pct));
                }
            }
        }
        AttackStage::Defense => {
            let def = &roster[defender];
            strike.defense = f64::from(def.def);
            if def.has_status(DEFEND_STATUS) {
                strike.defense *= 2.0;
            }
            if let Some(e) = roster[attacker].effect(|k| matches!(k, EffectKind::IgnoreDefense)) {
                strike.defense *= (1.0 - e.value).max(0.0);
            }
        }
        AttackStage::BaseDamage => {
            strike.damage = floor_damage(strike.attack - strike.defense);
        }
        AttackStage::Critical => {
            let atk = &roster[attacker];
            if checks::chance(dice, atk.crit_rate).passed {
                strike.crit = true;
                strike.damage = floor_damage(f64::from(strike.damage) * atk.crit_dmg);
            }
        }
        AttackStage::Reduction => {
            if let Some(e) =
                roster[defender].effect(|k| matches!(k, EffectKind::ReduceDamageTaken))
            {
                strike.damage = floor_damage(f64::from(strike.damage) * (1.0 - e.value));
            }
        }
        AttackStage::Shield => {
            log(format!(
                "[ATTACK][{}] hits {} for {}{}",
                roster[attacker].name,
                roster[defender].name,
                strike.damage,
                if strike.crit { " (CRIT!)" } else { "" }
            ));
            strike.taken = life::apply_damage(&mut roster[defender], strike.damage, &mut *log);
        }
        AttackStage::AttackerOnHit => {
            let effects = roster[attacker].effects.clone();
            for e in &effects {
                match &e.kind {
                    EffectKind::Lifesteal => {
                        if checks::chance(dice, e.trigger_chance()).passed {
                            let amount = fraction_of(strike.damage, e.value);
                            life::heal(&mut roster[attacker], amount, &mut *log);
                        }
                    }
                    EffectKind::ApplyStatusOnHit { status } => {
                        if checks::chance(dice, e.trigger_chance()).passed {
                            apply_on_hit_status(&mut roster[defender], status, &mut *log);
                        }
                    }
                    _ => {}
                }
            }
        }
        AttackStage::Retaliation => {
            let effects = roster[defender].effects.clone();
            for e in &effects {
                match &e.kind {
                    EffectKind::ThornsDamage => {
                        if checks::chance(dice, e.trigger_chance()).passed {
                            let amount = fraction_of(strike.damage, e.value);
                            if amount > 0 {
                                log(format!(
                                    "[THORNS][{}] reflects {} damage",
                                    roster[defender].name, amount
                                ));
                            }
                            life::lose_hp(&mut roster[attacker], amount, &mut *log);
                        }
                    }
                    EffectKind::ThornsStatus { status } => {
                        if checks::chance(dice, e.trigger_chance()).passed {
                            apply_status(&mut roster[attacker], status, &mut *log);
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CombatantKind, SpecialEffect, Status, StatusKind};

    fn duel(atk: i32, def: i32) -> Vec<Combatant> {
        let mut a = Combatant::new("p", "Hero", CombatantKind::Player, 100);
        a.atk = atk;
        let mut d = Combatant::new("e", "Goblin", CombatantKind::Enemy, 100);
        d.def = def;
        vec![a, d]
    }

    #[test]
    fn stages_run_in_declared_order() {
        let mut roster = duel(20, 5);
        let strike = basic_attack(&mut roster, 0, 1, &mut Dice::never(), &mut |_| {});
        assert_eq!(strike.stages, ATTACK_PIPELINE.to_vec());
    }

    #[test]
    fn evasion_stops_the_pipeline() {
        let mut roster = duel(20, 5);
        roster[1]
            .effects
            .push(SpecialEffect::new(EffectKind::Evasion, 0.5));
        let mut lines = vec![];
        let strike = basic_attack(
            &mut roster,
            0,
            1,
            &mut Dice::from_scripted(vec![0.1]),
            &mut |s| lines.push(s),
        );
        assert!(strike.evaded);
        assert_eq!(strike.stages, vec![AttackStage::Evasion]);
        assert_eq!(roster[1].hp, 100);
        assert_eq!(lines, vec!["[ATTACK][Hero] misses: Goblin evades".to_string()]);
    }

    #[test]
    fn defending_doubles_defense_before_ignore_defense() {
        let mut roster = duel(50, 10);
        roster[1]
            .statuses
            .push(Status::new(DEFEND_STATUS, 1, StatusKind::Good));
        roster[0]
            .effects
            .push(SpecialEffect::new(EffectKind::IgnoreDefense, 0.5));
        let strike = basic_attack(&mut roster, 0, 1, &mut Dice::never(), &mut |_| {});
        // 10 * 2 * 0.5 = 10 defense
        assert_eq!(strike.damage, 40);
    }

    #[test]
    fn berserker_scales_with_missing_hp() {
        let mut roster = duel(20, 0);
        roster[0].hp = 50;
        roster[0]
            .effects
            .push(SpecialEffect::new(EffectKind::BerserkerRage, 1.0));
        let strike = basic_attack(&mut roster, 0, 1, &mut Dice::never(), &mut |_| {});
        // 50% missing -> +50% ATK
        assert_eq!(strike.damage, 30);
    }

    #[test]
    fn crit_then_reduction() {
        let mut roster = duel(30, 10);
        roster[0].crit_rate = 0.5;
        roster[0].crit_dmg = 2.0;
        roster[1]
            .effects
            .push(SpecialEffect::new(EffectKind::ReduceDamageTaken, 0.25));
        let strike = basic_attack(
            &mut roster,
            0,
            1,
            &mut Dice::from_scripted(vec![0.0]),
            &mut |_| {},
        );
        assert!(strike.crit);
        // (30 - 10) * 2 = 40, then * 0.75
        assert_eq!(strike.damage, 30);
        assert_eq!(roster[1].hp, 70);
    }

    #[test]
    fn lifesteal_and_thorns_trade_hp() {
        let mut roster = duel(40, 0);
        roster[0].hp = 50;
        roster[0]
            .effects
            .push(SpecialEffect::new(EffectKind::Lifesteal, 0.5));
        roster[1]
            .effects
            .push(SpecialEffect::new(EffectKind::ThornsDamage, 0.25));
        basic_attack(&mut roster, 0, 1, &mut Dice::never(), &mut |_| {});
        // +20 from lifesteal, -10 from thorns
        assert_eq!(roster[0].hp, 60);
        assert_eq!(roster[1].hp, 60);
    }

    #[test]
    fn on_hit_status_rolls_its_own_chance() {
        let mut roster = duel(10, 0);
        roster[0].effects.push(
            SpecialEffect::new(
                EffectKind::ApplyStatusOnHit {
                    status: Status::stun(1),
                },
                0.0,
            )
            .with_chance(0.3),
        );
        // crit roll is skipped (crit_rate 0), so the only draw is the on-hit chance
        basic_attack(
            &mut roster,
            0,
            1,
            &mut Dice::from_scripted(vec![0.9]),
            &mut |_| {},
        );
        assert!(!roster[1].is_stunned());
        basic_attack(
            &mut roster,
            0,
            1,
            &mut Dice::from_scripted(vec![0.1]),
            &mut |_| {},
        );
        assert!(roster[1].is_stunned());
    }

    #[test]
    fn thorns_status_lands_on_attacker() {
        let mut roster = duel(10, 0);
        roster[1].effects.push(SpecialEffect::new(
            EffectKind::ThornsStatus {
                status: Status::new("Bleed", 2, StatusKind::Bad),
            },
            0.0,
        ));
        basic_attack(&mut roster, 0, 1, &mut Dice::never(), &mut |_| {});
        basic_attack(&mut roster, 0, 1, &mut Dice::never(), &mut |_| {});
        assert_eq!(roster[0].statuses.len(), 1);
        assert!(roster[0].has_status("Bleed"));
    }

    #[test]
    fn floor_damage_handles_degenerate_values() {
        assert_eq!(floor_damage(-40.0), 1);
        assert_eq!(floor_damage(f64::NAN), 1);
        assert_eq!(floor_damage(7.9), 7);
    }
}
