use combat_engine::combat::actions::execute_skill_action;
use combat_engine::{
    ActionError, Combatant, CombatantId, CombatantKind, Skill, SkillEffect, SkillId, SkillTarget,
    Status, StatusKind,
};

fn skill(id: &str, name: &str, cost: i32, cooldown: u32, target: SkillTarget, effects: Vec<SkillEffect>) -> Skill {
    Skill {
        id: id.into(),
        name: name.to_string(),
        description: String::new(),
        cost,
        cooldown,
        target,
        effects,
    }
}

fn mage() -> Combatant {
    let mut c = Combatant::new("mage", "Mage", CombatantKind::Player, 100);
    c.atk = 20;
    c.max_mp = 30;
    c.mp = 30;
    c.skills = vec![
        skill(
            "fireball",
            "Fireball",
            10,
            2,
            SkillTarget::SingleEnemy,
            vec![SkillEffect::Damage { value: 1.5 }],
        ),
        skill(
            "quake",
            "Quake",
            5,
            0,
            SkillTarget::AllEnemies,
            vec![
                SkillEffect::Damage { value: 1.0 },
                SkillEffect::ApplyStatus {
                    status: Status::new("Dazed", 2, StatusKind::Bad),
                },
            ],
        ),
        skill(
            "mend",
            "Mend",
            5,
            1,
            SkillTarget::Caster,
            vec![SkillEffect::Heal { value: 0.3 }],
        ),
    ];
    c
}

fn goblin(id: &str, mdef: i32) -> Combatant {
    let mut c = Combatant::new(id, "Goblin", CombatantKind::Enemy, 50);
    c.mdef = mdef;
    c
}

fn cid(s: &str) -> CombatantId {
    s.into()
}

fn sid(s: &str) -> SkillId {
    s.into()
}

#[test]
fn single_target_skill_pays_cost_and_starts_cooldown() {
    let roster = vec![mage(), goblin("gob", 5)];
    let res = execute_skill_action(&roster, &cid("mage"), &sid("fireball"), Some(&cid("gob"))).unwrap();

    let caster = &res.combatants[0];
    assert_eq!(caster.mp, 20);
    // one extra turn: the caster's own end-of-turn tick comes right after
    assert_eq!(caster.cooldown(&sid("fireball")), 3);
    // floor(20 * 1.5) - 5 mdef
    assert_eq!(res.combatants[1].hp, 25);
    assert_eq!(
        res.logs,
        vec![
            "[SKILL][Mage] casts Fireball (−10 MP)",
            "[SKILL][Mage] Fireball hits Goblin for 25",
            "[DMG][Goblin] 50 → 25 (−25)",
        ]
    );
}

#[test]
fn magic_defense_cannot_push_damage_below_one() {
    let roster = vec![mage(), goblin("gob", 500)];
    let res = execute_skill_action(&roster, &cid("mage"), &sid("fireball"), Some(&cid("gob"))).unwrap();
    assert_eq!(res.combatants[1].hp, 49);
}

#[test]
fn cooldown_is_checked_before_mana() {
    let mut m = mage();
    m.mp = 0;
    m.cooldowns.insert(sid("fireball"), 2);
    let roster = vec![m, goblin("gob", 0)];

    let err = execute_skill_action(&roster, &cid("mage"), &sid("fireball"), Some(&cid("gob"))).unwrap_err();
    assert_eq!(
        err,
        ActionError::OnCooldown {
            skill: "Fireball".into(),
            turns: 2
        }
    );
}

#[test]
fn insufficient_mana_is_rejected() {
    let mut m = mage();
    m.mp = 5;
    let roster = vec![m, goblin("gob", 0)];

    let err = execute_skill_action(&roster, &cid("mage"), &sid("fireball"), Some(&cid("gob"))).unwrap_err();
    assert_eq!(
        err,
        ActionError::InsufficientMana {
            skill: "Fireball".into(),
            cost: 10,
            available: 5
        }
    );
    assert_eq!(err.to_string(), "Fireball needs 10 MP but only 5 is available");
}

#[test]
fn single_target_skill_needs_a_living_opponent() {
    let mut dead = goblin("dead", 0);
    dead.hp = 0;
    let roster = vec![mage(), goblin("gob", 0), dead];

    assert_eq!(
        execute_skill_action(&roster, &cid("mage"), &sid("fireball"), None),
        Err(ActionError::NoTarget)
    );
    assert_eq!(
        execute_skill_action(&roster, &cid("mage"), &sid("fireball"), Some(&cid("mage"))),
        Err(ActionError::InvalidTarget(cid("mage")))
    );
    assert_eq!(
        execute_skill_action(&roster, &cid("mage"), &sid("fireball"), Some(&cid("dead"))),
        Err(ActionError::TargetDefeated(cid("dead")))
    );
    assert_eq!(
        execute_skill_action(&roster, &cid("mage"), &sid("meteor"), Some(&cid("gob"))),
        Err(ActionError::UnknownSkill(sid("meteor")))
    );
}

#[test]
fn area_skill_hits_every_living_opponent_only() {
    let mut dead = goblin("dead", 0);
    dead.hp = 0;
    let roster = vec![mage(), goblin("a", 0), dead, goblin("b", 10)];

    let res = execute_skill_action(&roster, &cid("mage"), &sid("quake"), None).unwrap();
    assert_eq!(res.combatants[1].hp, 30);
    assert_eq!(res.combatants[2].hp, 0);
    assert!(res.combatants[2].statuses.is_empty());
    assert_eq!(res.combatants[3].hp, 40);
    assert!(res.combatants[1].has_status("Dazed"));
    assert!(res.combatants[3].has_status("Dazed"));
    // caster is not an opponent of itself
    assert!(!res.combatants[0].has_status("Dazed"));
}

#[test]
fn self_heal_restores_a_share_of_max_hp() {
    let mut m = mage();
    m.hp = 50;
    let roster = vec![m, goblin("gob", 0)];

    let res = execute_skill_action(&roster, &cid("mage"), &sid("mend"), None).unwrap();
    assert_eq!(res.combatants[0].hp, 80);
    assert_eq!(res.combatants[0].mp, 25);
    assert!(res.logs.contains(&"[HEAL][Mage] +30 HP (50 → 80)".to_string()));
}

#[test]
fn area_status_skips_targets_the_damage_just_killed() {
    let mut frail = goblin("frail", 0);
    frail.hp = 10;
    let roster = vec![mage(), frail, goblin("tough", 0)];

    let res = execute_skill_action(&roster, &cid("mage"), &sid("quake"), None).unwrap();
    assert_eq!(res.combatants[1].hp, 0);
    assert!(res.combatants[1].statuses.is_empty());
    assert!(res.combatants[2].has_status("Dazed"));
    assert_eq!(
        res.logs.iter().filter(|l| l.contains("gains Dazed")).count(),
        1
    );
}

#[test]
fn extreme_heal_value_stays_within_max_hp() {
    let mut m = mage();
    m.hp = 50;
    m.skills.push(skill(
        "miracle",
        "Miracle",
        0,
        0,
        SkillTarget::Caster,
        vec![SkillEffect::Heal { value: 1.0e12 }],
    ));
    let roster = vec![m, goblin("gob", 0)];

    let res = execute_skill_action(&roster, &cid("mage"), &sid("miracle"), None).unwrap();
    assert_eq!(res.combatants[0].hp, 100);
}

#[test]
fn extreme_skill_damage_against_negative_mdef_saturates() {
    let mut m = mage();
    m.atk = 1000;
    m.skills.push(skill(
        "cataclysm",
        "Cataclysm",
        0,
        u32::MAX,
        SkillTarget::SingleEnemy,
        vec![SkillEffect::Damage { value: 1.0e12 }],
    ));
    let roster = vec![m, goblin("gob", -5)];

    let res = execute_skill_action(&roster, &cid("mage"), &sid("cataclysm"), Some(&cid("gob"))).unwrap();
    assert_eq!(res.combatants[1].hp, 0);
    assert!(res.logs.contains(&format!("[SKILL][Mage] Cataclysm hits Goblin for {}", i32::MAX)));
    assert_eq!(res.combatants[0].cooldown(&sid("cataclysm")), u32::MAX);
}
