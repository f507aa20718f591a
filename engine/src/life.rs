//! Hit point, mana and shield bookkeeping. Every mutation here keeps
//! `0 <= hp <= max_hp`, `0 <= mp <= max_mp` and `shield >= 0`.

use crate::model::Combatant;

/// How a single damage instance was split between shield and hp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageTaken {
    pub absorbed: i32,
    pub to_hp: i32,
    pub shield_broken: bool,
    pub dropped: bool,
}

/// Apply damage to a combatant: shield first, remainder to hp.
pub fn apply_damage(target: &mut Combatant, dmg: i32, mut log: impl FnMut(String)) -> DamageTaken {
    let dmg = dmg.max(0);
    let mut taken = DamageTaken::default();

    let mut remaining = dmg;
    if target.shield > 0 && remaining > 0 {
        taken.absorbed = remaining.min(target.shield);
        target.shield -= taken.absorbed;
        remaining -= taken.absorbed;
        log(format!(
            "[SHIELD][{}] absorbs {} damage ({} left)",
            target.name, taken.absorbed, target.shield
        ));
        if target.shield == 0 {
            taken.shield_broken = true;
            log(format!("[SHIELD][{}] shield breaks", target.name));
        }
    }

    if remaining > 0 {
        let before = target.hp;
        target.hp = (target.hp - remaining).max(0);
        taken.to_hp = before - target.hp;
        log(format!(
            "[DMG][{}] {} → {} (−{})",
            target.name, before, target.hp, remaining
        ));
        if before > 0 && target.hp == 0 {
            taken.dropped = true;
            log(format!("[STATE][{}] is defeated", target.name));
        }
    }
    taken
}

/// Direct hp loss that ignores the shield (thorns).
pub fn lose_hp(target: &mut Combatant, amount: i32, mut log: impl FnMut(String)) -> i32 {
    if amount <= 0 {
        return 0;
    }
    let before = target.hp;
    target.hp = (target.hp - amount).max(0);
    log(format!(
        "[DMG][{}] {} → {} (−{})",
        target.name, before, target.hp, amount
    ));
    if before > 0 && target.hp == 0 {
        log(format!("[STATE][{}] is defeated", target.name));
    }
    before - target.hp
}

/// Healing capped at `max_hp`. Returns the hp actually restored.
pub fn heal(target: &mut Combatant, amount: i32, mut log: impl FnMut(String)) -> i32 {
    if amount <= 0 {
        return 0;
    }
    let before = target.hp;
    target.hp = target.hp.saturating_add(amount).min(target.max_hp);
    let gained = target.hp - before;
    if gained > 0 {
        log(format!(
            "[HEAL][{}] +{} HP ({} → {})",
            target.name, gained, before, target.hp
        ));
    }
    gained
}

/// Mana restoration capped at `max_mp`. Returns the mp actually restored.
pub fn restore_mana(target: &mut Combatant, amount: i32, mut log: impl FnMut(String)) -> i32 {
    if amount <= 0 {
        return 0;
    }
    let before = target.mp;
    target.mp = target.mp.saturating_add(amount).min(target.max_mp);
    let gained = target.mp - before;
    if gained > 0 {
        log(format!(
            "[MANA][{}] +{} MP ({} → {})",
            target.name, gained, before, target.mp
        ));
    }
    gained
}

pub fn spend_mana(target: &mut Combatant, cost: i32) {
    target.mp = (target.mp - cost.max(0)).max(0);
}

/// `floor(base * fraction)` for resource math, never negative.
pub fn fraction_of(base: i32, fraction: f64) -> i32 {
    let v = (f64::from(base) * fraction).floor();
    if v.is_finite() && v > 0.0 { v as i32 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CombatantKind;

    fn dummy(hp: i32, shield: i32) -> Combatant {
        let mut c = Combatant::new("d", "Dummy", CombatantKind::Enemy, 100);
        c.hp = hp;
        c.shield = shield;
        c
    }

    #[test]
    fn damage_without_shield_hits_hp() {
        let mut c = dummy(40, 0);
        let mut lines = vec![];
        let taken = apply_damage(&mut c, 15, |s| lines.push(s));
        assert_eq!(c.hp, 25);
        assert_eq!(taken.to_hp, 15);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn partial_shield_absorbs_and_breaks() {
        let mut c = dummy(100, 20);
        let mut lines = vec![];
        let taken = apply_damage(&mut c, 35, |s| lines.push(s));
        assert_eq!(c.shield, 0);
        assert_eq!(c.hp, 85);
        assert_eq!(taken.absorbed, 20);
        assert!(taken.shield_broken);
        assert!(lines[0].starts_with("[SHIELD][Dummy] absorbs 20"));
        assert_eq!(lines[1], "[SHIELD][Dummy] shield breaks");
    }

    #[test]
    fn overkill_floors_at_zero() {
        let mut c = dummy(5, 0);
        let taken = apply_damage(&mut c, 50, |_| {});
        assert_eq!(c.hp, 0);
        assert!(taken.dropped);
        assert_eq!(taken.to_hp, 5);
    }

    #[test]
    fn heal_is_capped() {
        let mut c = dummy(95, 0);
        assert_eq!(heal(&mut c, 30, |_| {}), 5);
        assert_eq!(c.hp, 100);
    }

    #[test]
    fn huge_heals_and_mana_saturate_at_the_cap() {
        let mut c = dummy(50, 0);
        c.max_mp = 40;
        c.mp = 10;
        let amount = fraction_of(c.max_hp, 1.0e12);
        assert_eq!(heal(&mut c, amount, |_| {}), 50);
        assert_eq!(c.hp, 100);
        assert_eq!(restore_mana(&mut c, i32::MAX, |_| {}), 30);
        assert_eq!(c.mp, 40);
    }

    #[test]
    fn fraction_floors() {
        assert_eq!(fraction_of(100, 0.3), 30);
        assert_eq!(fraction_of(7, 0.5), 3);
        assert_eq!(fraction_of(10, -1.0), 0);
    }
}
