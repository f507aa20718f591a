//! Priority heuristic for NPC turns (also used as the player autopilot in
//! simulations): heal when critical, else the first usable damage skill,
//! else a basic attack.

use crate::model::{Combatant, CombatantId, SkillId, SkillTarget, living_opponents};

/// At or below this hp ratio an NPC prefers a self-heal.
pub const CRITICAL_HP_RATIO: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Stunned: the turn is lost.
    Stunned,
    /// Nobody left to fight; the turn passes without an action.
    Idle,
    Attack {
        target: CombatantId,
    },
    Cast {
        skill: SkillId,
        targets: Vec<CombatantId>,
    },
}

pub fn decide(roster: &[Combatant], actor: &CombatantId) -> Decision {
    let Some(me) = roster.iter().find(|c| &c.id == actor) else {
        return Decision::Idle;
    };
    if me.is_stunned() {
        return Decision::Stunned;
    }
    let opponents: Vec<&Combatant> = living_opponents(roster, me).collect();
    let Some(first) = opponents.first() else {
        return Decision::Idle;
    };

    if me.hp_ratio() <= CRITICAL_HP_RATIO {
        if let Some(heal) = me
            .skills
            .iter()
            .find(|s| s.is_self_heal() && me.can_use(s))
        {
            return Decision::Cast {
                skill: heal.id.clone(),
                targets: vec![me.id.clone()],
            };
        }
    }

    if let Some(skill) = me.skills.iter().find(|s| s.deals_damage() && me.can_use(s)) {
        let targets = match skill.target {
            SkillTarget::Caster => vec![me.id.clone()],
            SkillTarget::SingleEnemy => vec![first.id.clone()],
            SkillTarget::AllEnemies => opponents.iter().map(|c| c.id.clone()).collect(),
        };
        return Decision::Cast {
            skill: skill.id.clone(),
            targets,
        };
    }

    Decision::Attack {
        target: first.id.clone(),
    }
}
