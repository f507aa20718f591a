// Property-based checks on the numeric invariants of combat resolution
use combat_engine::combat::actions::execute_attack_action;
use combat_engine::combat::attack::floor_damage;
use combat_engine::combat::turns::initiative_order;
use combat_engine::life::apply_damage;
use combat_engine::{Combatant, CombatantKind, Dice, EffectKind, SpecialEffect};
use proptest::prelude::*;

fn fighter(id: &str, kind: CombatantKind, hp: i32, atk: i32, def: i32, shield: i32) -> Combatant {
    let mut c = Combatant::new(id, id, kind, 200);
    c.hp = hp;
    c.atk = atk;
    c.def = def;
    c.shield = shield;
    c
}

proptest! {
    #[test]
    fn proptest_attack_keeps_resources_in_bounds(
        atk in 0i32..300,
        def in 0i32..300,
        shield in 0i32..100,
        hp in 1i32..=200,
        crit_rate in 0.0f64..1.0,
        reduce in 0.0f64..1.0,
        thorns in 0.0f64..1.0,
        seed in any::<u64>(),
    ) {
        let mut a = fighter("a", CombatantKind::Player, 200, atk, 0, 0);
        a.crit_rate = crit_rate;
        a.effects.push(SpecialEffect::new(EffectKind::Lifesteal, 0.5));
        let mut d = fighter("d", CombatantKind::Enemy, hp, 0, def, shield);
        d.effects.push(SpecialEffect::new(EffectKind::ReduceDamageTaken, reduce));
        d.effects.push(SpecialEffect::new(EffectKind::ThornsDamage, thorns));
        let roster = vec![a, d];

        let res = execute_attack_action(&roster, &"a".into(), &"d".into(), &mut Dice::from_seed(seed))
            .unwrap();
        for c in &res.combatants {
            prop_assert!(c.hp >= 0 && c.hp <= c.max_hp);
            prop_assert!(c.shield >= 0);
        }
        // every landed hit removes at least one point of shield or hp
        let before = roster[1].hp + roster[1].shield;
        let after = res.combatants[1].hp + res.combatants[1].shield;
        prop_assert!(after < before);
    }

    #[test]
    fn proptest_damage_floor_is_one(raw in -1.0e6f64..1.0e6) {
        let dmg = floor_damage(raw);
        prop_assert!(dmg >= 1);
        if raw >= 1.0 {
            prop_assert_eq!(dmg, raw.floor() as i32);
        }
    }

    #[test]
    fn proptest_shield_absorbs_first(
        hp in 0i32..=200,
        shield in 0i32..200,
        dmg in 0i32..500,
    ) {
        let mut c = fighter("c", CombatantKind::Enemy, hp, 0, 0, shield);
        let taken = apply_damage(&mut c, dmg, |_| {});
        prop_assert_eq!(taken.absorbed, dmg.min(shield));
        prop_assert_eq!(c.shield, shield - taken.absorbed);
        prop_assert_eq!(c.hp, (hp - (dmg - taken.absorbed)).max(0));
        prop_assert_eq!(taken.shield_broken, shield > 0 && dmg >= shield);
    }

    #[test]
    fn proptest_initiative_is_sorted_and_stable(agis in prop::collection::vec(0i32..5, 1..12)) {
        let roster: Vec<Combatant> = agis
            .iter()
            .enumerate()
            .map(|(i, &agi)| {
                let mut c = Combatant::new(format!("c{i}"), "C", CombatantKind::Enemy, 10);
                c.agi = agi;
                c
            })
            .collect();
        let order = initiative_order(&roster);
        prop_assert_eq!(order.len(), roster.len());
        let ranked: Vec<(i32, usize)> = order
            .iter()
            .map(|id| {
                let i = roster.iter().position(|c| &c.id == id).unwrap();
                (roster[i].agi, i)
            })
            .collect();
        for pair in ranked.windows(2) {
            let ((agi_a, idx_a), (agi_b, idx_b)) = (pair[0], pair[1]);
            prop_assert!(agi_a > agi_b || (agi_a == agi_b && idx_a < idx_b));
        }
    }
}
