use thiserror::Error;

use crate::model::{CombatantId, SkillId};

/// A player or NPC action that cannot be carried out. Rejected actions leave
/// the encounter untouched and do not use up the turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("the encounter has already ended")]
    Concluded,
    #[error("it is not the player's turn")]
    NotPlayerTurn,
    #[error("it is not an NPC's turn")]
    NotNpcTurn,
    #[error("unknown combatant '{0}'")]
    UnknownCombatant(CombatantId),
    #[error("unknown skill '{0}'")]
    UnknownSkill(SkillId),
    #[error("{skill} needs {cost} MP but only {available} is available")]
    InsufficientMana {
        skill: String,
        cost: i32,
        available: i32,
    },
    #[error("{skill} is on cooldown for {turns} more turn(s)")]
    OnCooldown { skill: String, turns: u32 },
    #[error("no target selected")]
    NoTarget,
    #[error("'{0}' cannot be targeted")]
    InvalidTarget(CombatantId),
    #[error("'{0}' is already defeated")]
    TargetDefeated(CombatantId),
}

/// The roster handed to the engine cannot host an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncounterError {
    #[error("roster is empty")]
    EmptyRoster,
    #[error("roster has no player combatant")]
    MissingPlayer,
    #[error("combatant id '{0}' appears more than once")]
    DuplicateCombatant(CombatantId),
    #[error("game state is not in combat")]
    NotInCombat,
}
