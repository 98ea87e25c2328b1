//! Strategic playbook aggregation
//!
//! Read-only projection joining each scenario with its assessment, response
//! and actions. Missing joined data is replaced by defaults so the report
//! always renders something for every scenario.

use crate::state::SimulationState;
use crate::types::{
    ActionItem, Axis, AxisKind, ExerciseContext, FocalIssue, Force, ImpactAssessment, Quadrant,
    ResponseStrategy, RiskProfile, ScenarioId,
};
use serde::Serialize;

/// Number of critical uncertainties listed in the playbook header
pub const HEADLINE_UNCERTAINTIES: usize = 3;

/// One scenario with everything decided about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookEntry {
    pub scenario_id: ScenarioId,
    pub name: String,
    pub quadrant: Quadrant,
    pub narrative: String,
    pub signposts: Vec<String>,
    pub assessment: ImpactAssessment,
    pub composite_score: u8,
    pub response: Option<ResponseStrategy>,
    pub actions: Vec<ActionItem>,
    pub selected_action_count: usize,
}

/// Aggregated strategic playbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playbook {
    pub context: ExerciseContext,
    pub focal_issue: FocalIssue,
    pub x_axis: Option<Axis>,
    pub y_axis: Option<Axis>,
    pub risk_profile: RiskProfile,
    pub critical_uncertainties: Vec<Force>,
    pub entries: Vec<PlaybookEntry>,
    pub research_note_count: usize,
}

impl Playbook {
    /// Entry for a quadrant, if the matrix has been built
    #[must_use]
    pub fn entry(&self, quadrant: Quadrant) -> Option<&PlaybookEntry> {
        self.entries.iter().find(|e| e.quadrant == quadrant)
    }

    /// Selected actions across all scenarios
    pub fn selected_actions(&self) -> impl Iterator<Item = &ActionItem> {
        self.entries
            .iter()
            .flat_map(|e| e.actions.iter())
            .filter(|a| a.selected)
    }
}

/// Fold the whole state into a playbook, entries ordered TL, TR, BL, BR
///
/// Scenarios without a stored assessment are scored at `assessment_default`.
#[must_use]
pub fn build_playbook(state: &SimulationState, assessment_default: u8) -> Playbook {
    let mut scenarios: Vec<_> = state.scenarios.iter().collect();
    scenarios.sort_by_key(|s| s.quadrant);

    let entries = scenarios
        .into_iter()
        .map(|scenario| {
            let assessment = state.assessment_or(&scenario.id, assessment_default);
            let actions: Vec<ActionItem> = state.actions_for(&scenario.id).cloned().collect();
            PlaybookEntry {
                scenario_id: scenario.id.clone(),
                name: scenario.name.clone(),
                quadrant: scenario.quadrant,
                narrative: scenario.narrative.clone(),
                signposts: scenario.signposts.clone(),
                composite_score: assessment.composite(),
                assessment,
                response: state.responses.get(&scenario.id).copied(),
                selected_action_count: actions.iter().filter(|a| a.selected).count(),
                actions,
            }
        })
        .collect();

    Playbook {
        context: state.context.clone(),
        focal_issue: state.focal_issue.clone(),
        x_axis: state.axis(AxisKind::X),
        y_axis: state.axis(AxisKind::Y),
        risk_profile: state.risk_profile,
        critical_uncertainties: state
            .critical_uncertainties(HEADLINE_UNCERTAINTIES)
            .into_iter()
            .cloned()
            .collect(),
        entries,
        research_note_count: state.research_notes.len(),
    }
}
