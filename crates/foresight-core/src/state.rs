//! Simulation state tree
//!
//! [`SimulationState`] is the whole entity model of one exercise run. It is
//! plain data: the workflow store owns the live copy and is the only path
//! that mutates it, while gating rules, the report aggregator and the
//! snapshot interface all read it.

use crate::error::{WorkflowError, WorkflowResult};
use crate::registry::{MainPhase, SubStep};
use crate::types::{
    ActionItem, Axis, AxisKind, AxisLabels, ExerciseContext, FocalIssue, Force, ForceId,
    ImpactAssessment, Quadrant, ResearchNote, ResponseStrategy, RiskProfile, Scenario,
    ScenarioId, RATING_MAX,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Navigation position and completed phases
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub completed_main_phases: BTreeSet<MainPhase>,
    pub current_step: SubStep,
}

/// The two axis drivers and their extreme labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisSelection {
    pub x_force: Option<ForceId>,
    pub y_force: Option<ForceId>,
    pub x_labels: AxisLabels,
    pub y_labels: AxisLabels,
}

impl AxisSelection {
    /// Driver of one axis
    #[must_use]
    pub fn driver(&self, kind: AxisKind) -> Option<&ForceId> {
        match kind {
            AxisKind::X => self.x_force.as_ref(),
            AxisKind::Y => self.y_force.as_ref(),
        }
    }

    /// Labels of one axis
    #[must_use]
    pub fn labels(&self, kind: AxisKind) -> &AxisLabels {
        match kind {
            AxisKind::X => &self.x_labels,
            AxisKind::Y => &self.y_labels,
        }
    }

    pub(crate) fn labels_mut(&mut self, kind: AxisKind) -> &mut AxisLabels {
        match kind {
            AxisKind::X => &mut self.x_labels,
            AxisKind::Y => &mut self.y_labels,
        }
    }

    /// Full axis record, if a driver is selected
    #[must_use]
    pub fn axis(&self, kind: AxisKind) -> Option<Axis> {
        self.driver(kind).map(|force_id| Axis {
            kind,
            force_id: force_id.clone(),
            labels: self.labels(kind).clone(),
        })
    }

    /// Both drivers selected and distinct
    #[must_use]
    pub fn has_distinct_drivers(&self) -> bool {
        matches!((&self.x_force, &self.y_force), (Some(x), Some(y)) if x != y)
    }
}

/// Entire entity model of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationState {
    pub context: ExerciseContext,
    pub focal_issue: FocalIssue,
    pub forces: Vec<Force>,
    pub axes: AxisSelection,
    pub scenarios: Vec<Scenario>,
    pub assessments: IndexMap<ScenarioId, ImpactAssessment>,
    pub risk_profile: RiskProfile,
    pub responses: IndexMap<ScenarioId, ResponseStrategy>,
    pub actions: Vec<ActionItem>,
    pub research_notes: Vec<ResearchNote>,
    pub progress: ProgressState,
}

impl SimulationState {
    /// Fresh state at the start of the exercise
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a force
    #[must_use]
    pub fn force(&self, id: &ForceId) -> Option<&Force> {
        self.forces.iter().find(|f| &f.id == id)
    }

    /// Look up a scenario
    #[must_use]
    pub fn scenario(&self, id: &ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| &s.id == id)
    }

    /// Scenario occupying a quadrant
    #[must_use]
    pub fn scenario_in(&self, quadrant: Quadrant) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.quadrant == quadrant)
    }

    /// Whether a scenario id exists
    #[must_use]
    pub fn has_scenario(&self, id: &ScenarioId) -> bool {
        self.scenario(id).is_some()
    }

    /// Actions attached to a scenario, in insertion order
    pub fn actions_for<'a>(&'a self, id: &'a ScenarioId) -> impl Iterator<Item = &'a ActionItem> {
        self.actions.iter().filter(move |a| &a.scenario_id == id)
    }

    /// Assessment of a scenario, or a uniform one at `default` if none is stored
    #[must_use]
    pub fn assessment_or(&self, id: &ScenarioId, default: u8) -> ImpactAssessment {
        self.assessments
            .get(id)
            .copied()
            .unwrap_or_else(|| ImpactAssessment::uniform(default))
    }

    /// Full axis record
    #[must_use]
    pub fn axis(&self, kind: AxisKind) -> Option<Axis> {
        self.axes.axis(kind)
    }

    /// Forces with both ratings set
    #[must_use]
    pub fn rated_force_count(&self) -> usize {
        self.forces.iter().filter(|f| f.is_rated()).count()
    }

    /// Rated forces ranked by impact x uncertainty (ties keep insertion order)
    #[must_use]
    pub fn critical_uncertainties(&self, limit: usize) -> Vec<&Force> {
        let mut rated: Vec<&Force> = self.forces.iter().filter(|f| f.is_rated()).collect();
        rated.sort_by(|a, b| b.criticality().cmp(&a.criticality()));
        rated.truncate(limit);
        rated
    }

    pub(crate) fn force_mut(&mut self, id: &ForceId) -> Option<&mut Force> {
        self.forces.iter_mut().find(|f| &f.id == id)
    }

    pub(crate) fn scenario_mut(&mut self, id: &ScenarioId) -> Option<&mut Scenario> {
        self.scenarios.iter_mut().find(|s| &s.id == id)
    }

    pub(crate) fn require_scenario(&self, id: &ScenarioId) -> WorkflowResult<()> {
        if self.has_scenario(id) {
            Ok(())
        } else {
            Err(WorkflowError::invalid_selection(format!("unknown scenario: {id}")))
        }
    }

    /// Replace the force set; returns true if the matrix had to be reset
    pub(crate) fn replace_forces(&mut self, forces: Vec<Force>) -> WorkflowResult<bool> {
        {
            let mut seen = HashSet::with_capacity(forces.len());
            if let Some(dup) = forces.iter().find(|f| !seen.insert(&f.id)) {
                return Err(WorkflowError::invalid_selection(format!(
                    "duplicate force id: {}",
                    dup.id
                )));
            }
        }

        self.forces = forces
            .into_iter()
            .map(|mut f| {
                f.impact = f.impact.min(RATING_MAX);
                f.uncertainty = f.uncertainty.min(RATING_MAX);
                f
            })
            .collect();
        Ok(self.drop_missing_drivers())
    }

    /// Remove a force; returns `None` if unknown, else whether the matrix reset
    pub(crate) fn remove_force(&mut self, id: &ForceId) -> Option<bool> {
        let before = self.forces.len();
        self.forces.retain(|f| &f.id != id);
        if self.forces.len() == before {
            return None;
        }
        self.research_notes
            .iter_mut()
            .for_each(|n| n.linked_force_ids.retain(|f| f != id));
        Some(self.drop_missing_drivers())
    }

    fn drop_missing_drivers(&mut self) -> bool {
        let mut changed = false;
        for kind in [AxisKind::X, AxisKind::Y] {
            let missing = self
                .axes
                .driver(kind)
                .is_some_and(|id| self.force(id).is_none());
            if missing {
                match kind {
                    AxisKind::X => self.axes.x_force = None,
                    AxisKind::Y => self.axes.y_force = None,
                }
                changed = true;
            }
        }
        if changed {
            self.clear_matrix();
        }
        changed
    }

    /// Remove a scenario and every record that depends on it
    pub(crate) fn remove_scenario_cascade(&mut self, id: &ScenarioId) -> bool {
        let before = self.scenarios.len();
        self.scenarios.retain(|s| &s.id != id);
        if self.scenarios.len() == before {
            return false;
        }
        self.assessments.shift_remove(id);
        self.responses.shift_remove(id);
        self.actions.retain(|a| &a.scenario_id != id);
        self.research_notes
            .iter_mut()
            .for_each(|n| n.linked_scenario_ids.retain(|s| s != id));
        true
    }

    /// Drop all scenarios and their dependents; returns how many were removed
    pub(crate) fn clear_matrix(&mut self) -> usize {
        let ids: Vec<ScenarioId> = self.scenarios.iter().map(|s| s.id.clone()).collect();
        for id in &ids {
            self.remove_scenario_cascade(id);
        }
        ids.len()
    }

    pub(crate) fn validate_note_links(&self, note: &ResearchNote) -> WorkflowResult<()> {
        if let Some(id) = note.linked_force_ids.iter().find(|id| self.force(id).is_none()) {
            return Err(WorkflowError::invalid_selection(format!(
                "note links unknown force: {id}"
            )));
        }
        if let Some(id) = note
            .linked_scenario_ids
            .iter()
            .find(|id| !self.has_scenario(id))
        {
            return Err(WorkflowError::invalid_selection(format!(
                "note links unknown scenario: {id}"
            )));
        }
        Ok(())
    }
}
