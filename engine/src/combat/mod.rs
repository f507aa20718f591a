//! Combat resolution: attack pipeline, skills, turn order, NPC policy and the
//! termination check.

pub mod actions;
pub mod attack;
pub mod outcome;
pub mod policy;
pub mod turns;

use crate::model::Combatant;

/// Output of a pure resolver call: log lines plus the updated roster.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub logs: Vec<String>,
    pub combatants: Vec<Combatant>,
}
