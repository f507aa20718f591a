//! The encounter state machine.
//!
//! An [`Encounter`] owns a deep copy of the roster for the length of a fight.
//! Every transition (`act`, `npc_step`) runs to completion: the action, the
//! termination check, the actor's end-of-turn upkeep and the advance to the
//! next living combatant. Rejected actions change nothing.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::combat::actions::{
    attack_action, defend, skill_action, skill_targets, validate_skill, validate_target,
};
use crate::combat::outcome::{self, CombatResult, ConsumedEffects, Verdict};
use crate::combat::policy::{self, Decision};
use crate::combat::turns::{TurnOrder, round_completed};
use crate::conditions::end_of_turn;
use crate::error::{ActionError, EncounterError};
use crate::model::{Combatant, CombatantId, SkillId, SourceId, position};
use crate::Dice;

/// Lines kept in the rolling combat log.
pub const LOG_CAPACITY: usize = 50;

/// Bounded ring of recent combat messages; the oldest line is dropped first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatLog {
    lines: VecDeque<String>,
}

impl CombatLog {
    pub fn push(&mut self, line: String) {
        if self.lines.len() == LOG_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    Attack {
        target: CombatantId,
    },
    Skill {
        skill: SkillId,
        target: Option<CombatantId>,
    },
    Defend,
    Flee,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    PlayerTurn(CombatantId),
    NpcTurn(CombatantId),
    Concluded(CombatResult),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterEvent {
    /// A one-time effect fired; the session must remember its source.
    OneTimeEffectUsed(SourceId),
    Concluded(CombatResult),
}

/// Everything one transition produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub actor: Option<CombatantId>,
    pub logs: Vec<String>,
    pub events: Vec<EncounterEvent>,
}

impl StepReport {
    pub fn outcome(&self) -> Option<CombatResult> {
        self.events.iter().find_map(|e| match e {
            EncounterEvent::Concluded(r) => Some(*r),
            _ => None,
        })
    }
}

/// Final hand-off of a concluded encounter.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatEnd {
    pub result: CombatResult,
    pub turns_elapsed: u32,
    pub combatants: Vec<Combatant>,
}

pub struct Encounter {
    roster: Vec<Combatant>,
    order: TurnOrder,
    log: CombatLog,
    result: Option<CombatResult>,
    consumed: ConsumedEffects,
    dice: Dice,
}

impl fmt::Debug for Encounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encounter")
            .field("order", &self.order)
            .field("result", &self.result)
            .field("combatants", &self.roster.len())
            .finish_non_exhaustive()
    }
}

impl Encounter {
    /// Start an encounter from a copy of `combatants`.
    ///
    /// `consumed` lists one-time effects already spent in the session.
    pub fn start(
        combatants: &[Combatant],
        consumed: ConsumedEffects,
        dice: Dice,
    ) -> Result<Self, EncounterError> {
        if combatants.is_empty() {
            return Err(EncounterError::EmptyRoster);
        }
        let mut seen = HashSet::new();
        for c in combatants {
            if !seen.insert(&c.id) {
                return Err(EncounterError::DuplicateCombatant(c.id.clone()));
            }
        }
        if !combatants.iter().any(Combatant::is_player) {
            return Err(EncounterError::MissingPlayer);
        }

        let mut roster = combatants.to_vec();
        for c in roster.iter_mut() {
            c.normalize();
        }
        let order = TurnOrder::initialize(&roster);
        let mut encounter = Self {
            roster,
            order,
            log: CombatLog::default(),
            result: None,
            consumed,
            dice,
        };

        let mut report = StepReport::default();
        let names: Vec<&str> = encounter
            .order
            .ids()
            .iter()
            .filter_map(|id| position(&encounter.roster, id))
            .map(|i| encounter.roster[i].name.as_str())
            .collect();
        report.logs.push(format!("[START] turn order: {}", names.join(" → ")));
        if !encounter.settle_verdict(&mut report) {
            encounter.settle(&mut report);
        }
        encounter.commit(&report);
        tracing::debug!(order = ?encounter.order.ids(), "encounter started");
        Ok(encounter)
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.roster
    }

    pub fn combatant(&self, id: &CombatantId) -> Option<&Combatant> {
        self.roster.iter().find(|c| &c.id == id)
    }

    pub fn player(&self) -> Option<&Combatant> {
        self.roster.iter().find(|c| c.is_player())
    }

    pub fn turn_order(&self) -> &[CombatantId] {
        self.order.ids()
    }

    pub fn current_turn_index(&self) -> usize {
        self.order.current_index()
    }

    pub fn turns_elapsed(&self) -> u32 {
        self.order.turns_elapsed()
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn result(&self) -> Option<CombatResult> {
        self.result
    }

    pub fn consumed(&self) -> &ConsumedEffects {
        &self.consumed
    }

    pub fn phase(&self) -> Phase {
        if let Some(result) = self.result {
            return Phase::Concluded(result);
        }
        match self.current_position() {
            Some(i) if self.roster[i].is_player() => Phase::PlayerTurn(self.roster[i].id.clone()),
            Some(i) => Phase::NpcTurn(self.roster[i].id.clone()),
            None => Phase::Concluded(CombatResult::Loss),
        }
    }

    /// Whether player-facing actions are currently allowed.
    pub fn awaiting_player(&self) -> bool {
        matches!(self.phase(), Phase::PlayerTurn(_))
    }

    /// Run the player's chosen action.
    pub fn act(&mut self, action: PlayerAction) -> Result<StepReport, ActionError> {
        let actor = match self.ready_actor(true) {
            Ok(i) => i,
            Err(err) => return Err(self.reject(err)),
        };
        let mut report = StepReport {
            actor: Some(self.roster[actor].id.clone()),
            ..StepReport::default()
        };

        match action {
            PlayerAction::Flee => {
                report
                    .logs
                    .push(format!("[FLEE][{}] escapes the fight", self.roster[actor].name));
                self.conclude_with(CombatResult::Flee, &mut report);
                self.commit(&report);
                return Ok(report);
            }
            PlayerAction::Attack { target } => {
                let target = match validate_target(&self.roster, actor, &target) {
                    Ok(t) => t,
                    Err(err) => return Err(self.reject(err)),
                };
                attack_action(&mut self.roster, actor, target, &mut self.dice, &mut |s| {
                    report.logs.push(s)
                });
            }
            PlayerAction::Skill { skill, target } => {
                let prepared = validate_skill(&self.roster[actor], &skill)
                    .cloned()
                    .and_then(|s| {
                        skill_targets(&self.roster, actor, &s, target.as_ref()).map(|t| (s, t))
                    });
                let (skill, targets) = match prepared {
                    Ok(p) => p,
                    Err(err) => return Err(self.reject(err)),
                };
                skill_action(&mut self.roster, actor, &targets, &skill, &mut |s| {
                    report.logs.push(s)
                });
            }
            PlayerAction::Defend => {
                defend(&mut self.roster, actor, &mut |s| report.logs.push(s));
            }
        }

        self.finish_turn(actor, &mut report);
        self.commit(&report);
        Ok(report)
    }

    /// Run the current NPC's turn according to the decision policy.
    pub fn npc_step(&mut self) -> Result<StepReport, ActionError> {
        let actor = match self.ready_actor(false) {
            Ok(i) => i,
            Err(err) => return Err(self.reject(err)),
        };
        let report = self.run_policy_turn(actor)?;
        Ok(report)
    }

    /// Execute NPC turns until the player is up or the fight is over.
    pub fn run_npc_turns(&mut self) -> Result<Vec<StepReport>, ActionError> {
        let mut reports = Vec::new();
        while matches!(self.phase(), Phase::NpcTurn(_)) {
            reports.push(self.npc_step()?);
        }
        Ok(reports)
    }

    /// Let the decision policy play whichever side is up. Used by simulations.
    pub fn autopilot_step(&mut self) -> Result<StepReport, ActionError> {
        match self.phase() {
            Phase::Concluded(_) => Err(self.reject(ActionError::Concluded)),
            Phase::NpcTurn(_) => self.npc_step(),
            Phase::PlayerTurn(_) => {
                let actor = match self.ready_actor(true) {
                    Ok(i) => i,
                    Err(err) => return Err(self.reject(err)),
                };
                self.run_policy_turn(actor)
            }
        }
    }

    /// Hand the encounter back once it has a result. An encounter that is
    /// still running is returned unchanged in `Err`.
    #[allow(clippy::result_large_err)]
    pub fn conclude(self) -> Result<CombatEnd, Encounter> {
        match self.result {
            Some(result) => Ok(CombatEnd {
                result,
                turns_elapsed: self.order.turns_elapsed(),
                combatants: self.roster,
            }),
            None => Err(self),
        }
    }

    fn run_policy_turn(&mut self, actor: usize) -> Result<StepReport, ActionError> {
        let id = self.roster[actor].id.clone();
        let mut report = StepReport {
            actor: Some(id.clone()),
            ..StepReport::default()
        };
        let decision = policy::decide(&self.roster, &id);
        tracing::debug!(actor = %id, ?decision, "policy decision");

        match decision {
            Decision::Stunned => {
                report.logs.push(format!(
                    "[TURN][{}] is stunned and loses the turn",
                    self.roster[actor].name
                ));
            }
            Decision::Idle => {
                report
                    .logs
                    .push(format!("[TURN][{}] has no one to fight", self.roster[actor].name));
            }
            Decision::Attack { target } => {
                let target = validate_target(&self.roster, actor, &target)
                    .map_err(|err| self.reject(err))?;
                attack_action(&mut self.roster, actor, target, &mut self.dice, &mut |s| {
                    report.logs.push(s)
                });
            }
            Decision::Cast { skill, targets } => {
                let skill = validate_skill(&self.roster[actor], &skill)
                    .cloned()
                    .map_err(|err| self.reject(err))?;
                let targets: Vec<usize> = targets
                    .iter()
                    .filter_map(|t| position(&self.roster, t))
                    .collect();
                skill_action(&mut self.roster, actor, &targets, &skill, &mut |s| {
                    report.logs.push(s)
                });
            }
        }

        self.finish_turn(actor, &mut report);
        self.commit(&report);
        Ok(report)
    }

    fn current_position(&self) -> Option<usize> {
        self.order
            .current()
            .and_then(|id| position(&self.roster, id))
    }

    fn ready_actor(&self, player: bool) -> Result<usize, ActionError> {
        if self.result.is_some() {
            return Err(ActionError::Concluded);
        }
        match self.current_position() {
            Some(i) if self.roster[i].is_player() == player => Ok(i),
            _ if player => Err(ActionError::NotPlayerTurn),
            _ => Err(ActionError::NotNpcTurn),
        }
    }

    fn reject(&mut self, err: ActionError) -> ActionError {
        tracing::warn!(%err, "action rejected");
        self.log.push(format!("[REJECT] {err}"));
        err
    }

    fn commit(&mut self, report: &StepReport) {
        for line in &report.logs {
            self.log.push(line.clone());
        }
    }

    fn conclude_with(&mut self, result: CombatResult, report: &mut StepReport) {
        if self.result.is_some() {
            return;
        }
        self.result = Some(result);
        report.events.push(EncounterEvent::Concluded(result));
        report.logs.push(format!(
            "[END] {:?} after {} round(s)",
            result,
            self.order.turns_elapsed()
        ));
        tracing::debug!(?result, turns = self.order.turns_elapsed(), "encounter concluded");
    }

    /// Run the termination check. Returns true when the fight is over.
    fn settle_verdict(&mut self, report: &mut StepReport) -> bool {
        let verdict = outcome::check(&mut self.roster, &mut self.consumed, |s| {
            report.logs.push(s)
        });
        match verdict {
            Verdict::Ongoing => false,
            Verdict::Revived(source) => {
                report.events.push(EncounterEvent::OneTimeEffectUsed(source));
                false
            }
            Verdict::Concluded(result) => {
                self.conclude_with(result, report);
                true
            }
        }
    }

    fn finish_turn(&mut self, actor: usize, report: &mut StepReport) {
        if self.settle_verdict(report) {
            return;
        }
        let id = self.roster[actor].id.clone();
        end_of_turn(&mut self.roster, &id, |s| report.logs.push(s));
        if self.settle_verdict(report) {
            return;
        }
        self.step_pointer();
        self.settle(report);
    }

    fn step_pointer(&mut self) {
        if self.order.advance() {
            round_completed(&mut self.roster, self.order.turns_elapsed());
        }
    }

    /// Move the pointer past defeated combatants and past a stunned player.
    fn settle(&mut self, report: &mut StepReport) {
        for _ in 0..self.order.len() * 2 {
            if self.result.is_some() {
                return;
            }
            let Some(i) = self.current_position() else {
                return;
            };
            let c = &self.roster[i];
            if !c.is_alive() {
                self.step_pointer();
                continue;
            }
            if c.is_player() && c.is_stunned() {
                report
                    .logs
                    .push(format!("[TURN][{}] is stunned and loses the turn", c.name));
                let id = c.id.clone();
                end_of_turn(&mut self.roster, &id, |s| report.logs.push(s));
                if self.settle_verdict(report) {
                    return;
                }
                self.step_pointer();
                continue;
            }
            return;
        }
    }
}
