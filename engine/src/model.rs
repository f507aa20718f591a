//! Combatants, statuses, passive effects and skills as handed to the engine.
//!
//! Field names follow the JSON contract of the surrounding game client
//! (camelCase, SCREAMING_SNAKE_CASE type tags) so a `GameState` snapshot can be
//! deserialized directly.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Status name that makes a combatant lose its turn.
pub const STUN_STATUS: &str = "Choáng";
/// Status name granted by the defend action; doubles base defense.
pub const DEFEND_STATUS: &str = "Defending";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Stable identifier of a combatant for the length of an encounter.
    CombatantId
);
string_id!(SkillId);
string_id!(
    /// Key of a one-time-use effect (e.g. a revival shield granted by an item).
    SourceId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatantKind {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKind {
    Good,
    Bad,
    #[default]
    #[serde(other)]
    Neutral,
}

/// A timed, named condition. `duration` counts the owner's remaining turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effect: String,
    pub duration: u32,
    #[serde(rename = "type", default)]
    pub kind: StatusKind,
}

impl Status {
    pub fn new(name: impl Into<String>, duration: u32, kind: StatusKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            effect: String::new(),
            duration,
            kind,
        }
    }

    pub fn stun(duration: u32) -> Self {
        Self::new(STUN_STATUS, duration, StatusKind::Bad)
    }
}

/// Passive modifier kinds. Payload-free kinds read their magnitude from
/// [`SpecialEffect::value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    Evasion,
    Lifesteal,
    ThornsDamage,
    ThornsStatus {
        status: Status,
    },
    ApplyStatusOnHit {
        status: Status,
    },
    IgnoreDefense,
    ReduceDamageTaken,
    DoubleAttack,
    BerserkerRage,
    HealOverTime,
    ManaOverTime,
    StatusImmunity {
        #[serde(default)]
        status: Option<Status>,
    },
    OverhealShield,
}

/// A passive effect that lasts for the whole encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialEffect {
    #[serde(flatten)]
    pub kind: EffectKind,
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<SourceId>,
}

impl SpecialEffect {
    pub fn new(kind: EffectKind, value: f64) -> Self {
        Self {
            kind,
            value,
            chance: None,
            source_id: None,
        }
    }

    pub fn with_chance(mut self, chance: f64) -> Self {
        self.chance = Some(chance);
        self
    }

    pub fn with_source(mut self, source: impl Into<SourceId>) -> Self {
        self.source_id = Some(source.into());
        self
    }

    /// Trigger probability for on-hit effects; absent means always.
    /// DOUBLE_ATTACK is the exception: without a `chance` it rolls against
    /// `value` (see `combat::actions::attack_action`).
    pub fn trigger_chance(&self) -> f64 {
        self.chance.unwrap_or(1.0)
    }

    /// Whether this immunity blocks a status of the given name.
    pub fn blocks_status(&self, name: &str) -> bool {
        match &self.kind {
            EffectKind::StatusImmunity { status } => {
                name == STUN_STATUS || status.as_ref().is_some_and(|s| s.name == name)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillTarget {
    #[serde(rename = "SELF")]
    Caster,
    SingleEnemy,
    AllEnemies,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillEffect {
    Damage { value: f64 },
    Heal { value: f64 },
    ApplyStatus { status: Status },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: i32,
    #[serde(default)]
    pub cooldown: u32,
    pub target: SkillTarget,
    #[serde(default)]
    pub effects: Vec<SkillEffect>,
}

impl Skill {
    pub fn deals_damage(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, SkillEffect::Damage { .. }))
    }

    pub fn is_self_heal(&self) -> bool {
        self.target == SkillTarget::Caster
            && self
                .effects
                .iter()
                .any(|e| matches!(e, SkillEffect::Heal { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CombatantKind,
    pub hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub mp: i32,
    #[serde(default)]
    pub max_mp: i32,
    #[serde(default)]
    pub shield: i32,
    #[serde(default)]
    pub atk: i32,
    #[serde(default)]
    pub def: i32,
    #[serde(default)]
    pub mdef: i32,
    #[serde(default)]
    pub agi: i32,
    #[serde(default)]
    pub crit_rate: f64,
    #[serde(default = "default_crit_dmg")]
    pub crit_dmg: f64,
    #[serde(default)]
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub effects: Vec<SpecialEffect>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub cooldowns: IndexMap<SkillId, u32>,
}

fn default_crit_dmg() -> f64 {
    1.5
}

impl Combatant {
    /// Bare combatant at full health with no stats; tests and content builders
    /// fill in the rest.
    pub fn new(id: impl Into<CombatantId>, name: &str, kind: CombatantKind, max_hp: i32) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            kind,
            hp: max_hp,
            max_hp,
            mp: 0,
            max_mp: 0,
            shield: 0,
            atk: 0,
            def: 0,
            mdef: 0,
            agi: 0,
            crit_rate: 0.0,
            crit_dmg: default_crit_dmg(),
            statuses: Vec::new(),
            effects: Vec::new(),
            skills: Vec::new(),
            cooldowns: IndexMap::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_player(&self) -> bool {
        self.kind == CombatantKind::Player
    }

    pub fn is_opponent_of(&self, other: &Combatant) -> bool {
        self.kind != other.kind
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        f64::from(self.hp) / f64::from(self.max_hp)
    }

    pub fn has_status(&self, name: &str) -> bool {
        self.statuses.iter().any(|s| s.name == name)
    }

    pub fn is_stunned(&self) -> bool {
        self.has_status(STUN_STATUS)
    }

    /// First passive effect matching the predicate.
    pub fn effect(&self, pred: impl Fn(&EffectKind) -> bool) -> Option<&SpecialEffect> {
        self.effects.iter().find(|e| pred(&e.kind))
    }

    pub fn skill(&self, id: &SkillId) -> Option<&Skill> {
        self.skills.iter().find(|s| &s.id == id)
    }

    pub fn cooldown(&self, id: &SkillId) -> u32 {
        self.cooldowns.get(id).copied().unwrap_or(0)
    }

    pub fn can_use(&self, skill: &Skill) -> bool {
        self.mp >= skill.cost && self.cooldown(&skill.id) == 0
    }

    /// Restore the numeric invariants: `0 <= hp <= max_hp`, `0 <= mp <= max_mp`,
    /// `shield >= 0`.
    pub fn normalize(&mut self) {
        self.max_hp = self.max_hp.max(0);
        self.max_mp = self.max_mp.max(0);
        self.hp = self.hp.clamp(0, self.max_hp);
        self.mp = self.mp.clamp(0, self.max_mp);
        self.shield = self.shield.max(0);
    }
}

/// Index of a combatant in the roster.
pub fn position(roster: &[Combatant], id: &CombatantId) -> Option<usize> {
    roster.iter().position(|c| &c.id == id)
}

/// Living combatants on the opposite side of `actor`, in roster order.
pub fn living_opponents<'a>(
    roster: &'a [Combatant],
    actor: &'a Combatant,
) -> impl Iterator<Item = &'a Combatant> + 'a {
    roster
        .iter()
        .filter(move |c| c.is_alive() && c.is_opponent_of(actor))
}
