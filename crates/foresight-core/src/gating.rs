//! Gating rules
//!
//! One pure predicate per sub-step deciding whether the user may continue.
//! Gating is advisory: the store records navigation regardless, and the UI
//! consults these rules to enable its "continue" action.

use crate::config::WorkflowConfig;
use crate::registry::SubStep;
use crate::state::SimulationState;
use serde::Serialize;

/// Outcome of evaluating one step's gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum Gate {
    /// The user may continue
    Open,
    /// Continuing is not yet allowed
    Blocked(&'static str),
}

impl Gate {
    fn when(passable: bool, reason: &'static str) -> Self {
        if passable {
            Gate::Open
        } else {
            Gate::Blocked(reason)
        }
    }

    /// True for [`Gate::Open`]
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Gate::Open)
    }
}

/// Gate predicates bound to a configured narrative threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateRules {
    narrative_min_chars: usize,
}

impl GateRules {
    /// Rules for a configuration
    #[must_use]
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            narrative_min_chars: config.narrative_min_chars,
        }
    }

    /// Evaluate the gate that guards leaving `step`
    #[must_use]
    pub fn evaluate(&self, step: SubStep, state: &SimulationState) -> Gate {
        use SubStep::*;
        match step {
            PreRead => Gate::Open,
            Context => Gate::when(
                context_complete(state),
                "industry and organization type are required",
            ),
            FocalIssue => Gate::when(
                focal_issue_defined(state),
                "a strategic question is required",
            ),
            Forces => Gate::when(forces_present(state), "add at least one driving force"),
            Uncertainties => Gate::when(
                axis_drivers_selected(state),
                "select two different forces as axis drivers",
            ),
            Axes => Gate::when(
                axis_labels_complete(state),
                "label both extremes of both axes",
            ),
            Matrix => Gate::when(matrix_complete(state), "build the four-scenario matrix"),
            Narratives => Gate::when(
                narratives_complete(state, self.narrative_min_chars),
                "every scenario needs a longer narrative",
            ),
            Impact => Gate::when(impact_assessed(state), "no scenarios to assess"),
            Risk => Gate::when(risk_profile_set(state), "set the organization's risk appetite"),
            Responses => Gate::when(
                responses_assigned(state),
                "assign a response strategy to every scenario",
            ),
            Actions => Gate::when(
                actions_planned(state),
                "plan at least one action for every scenario",
            ),
            Report => Gate::Open,
        }
    }

    /// Whether the user may continue past `step`
    #[inline]
    #[must_use]
    pub fn can_advance(&self, step: SubStep, state: &SimulationState) -> bool {
        self.evaluate(step, state).is_open()
    }

    /// Gate status for every step, in pipeline order
    #[must_use]
    pub fn status(&self, state: &SimulationState) -> Vec<(SubStep, Gate)> {
        SubStep::ALL
            .iter()
            .map(|step| (*step, self.evaluate(*step, state)))
            .collect()
    }

    /// Furthest step reachable from the start without crossing a closed gate
    #[must_use]
    pub fn furthest_reachable(&self, state: &SimulationState) -> SubStep {
        SubStep::ALL
            .iter()
            .copied()
            .find(|step| !self.can_advance(*step, state))
            .unwrap_or(SubStep::Report)
    }
}

impl Default for GateRules {
    fn default() -> Self {
        Self::new(&WorkflowConfig::default())
    }
}

/// Whether continuing past `step` is permitted under default thresholds
#[inline]
#[must_use]
pub fn can_advance(step: SubStep, state: &SimulationState) -> bool {
    GateRules::default().can_advance(step, state)
}

/// Context step: industry and organization type filled in
#[must_use]
pub fn context_complete(state: &SimulationState) -> bool {
    !state.context.industry.trim().is_empty() && !state.context.organization_type.trim().is_empty()
}

/// Focal-issue step: a strategic question exists
#[must_use]
pub fn focal_issue_defined(state: &SimulationState) -> bool {
    !state.focal_issue.strategic_question.trim().is_empty()
}

/// Forces step: at least one force, rated or not
#[must_use]
pub fn forces_present(state: &SimulationState) -> bool {
    !state.forces.is_empty()
}

/// Uncertainties step: two distinct axis drivers
#[must_use]
pub fn axis_drivers_selected(state: &SimulationState) -> bool {
    state.axes.has_distinct_drivers()
}

/// Axes step: both extremes of both axes labeled
#[must_use]
pub fn axis_labels_complete(state: &SimulationState) -> bool {
    state.axes.x_labels.is_complete() && state.axes.y_labels.is_complete()
}

/// Matrix step: exactly four scenarios
#[must_use]
pub fn matrix_complete(state: &SimulationState) -> bool {
    state.scenarios.len() == 4
}

/// Narratives step: every narrative strictly longer than `min_chars` characters
#[must_use]
pub fn narratives_complete(state: &SimulationState, min_chars: usize) -> bool {
    !state.scenarios.is_empty()
        && state
            .scenarios
            .iter()
            .all(|s| s.narrative.chars().count() > min_chars)
}

/// Impact step: any scenarios exist
///
/// Scores default to a rated midpoint, so this passes as soon as the matrix
/// is built even if no slider was touched.
#[must_use]
pub fn impact_assessed(state: &SimulationState) -> bool {
    !state.scenarios.is_empty()
}

/// Risk step: appetite set
#[must_use]
pub fn risk_profile_set(state: &SimulationState) -> bool {
    state.risk_profile.is_set()
}

/// Responses step: every scenario has a response strategy
#[must_use]
pub fn responses_assigned(state: &SimulationState) -> bool {
    !state.scenarios.is_empty()
        && state
            .scenarios
            .iter()
            .all(|s| state.responses.contains_key(&s.id))
}

/// Actions step: every scenario has at least one action
#[must_use]
pub fn actions_planned(state: &SimulationState) -> bool {
    !state.scenarios.is_empty()
        && state
            .scenarios
            .iter()
            .all(|s| state.actions_for(&s.id).next().is_some())
}
