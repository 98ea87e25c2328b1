//! Structured generation requests
//!
//! Each request carries exactly the slice of the exercise the generator
//! needs. Requests are built from a state snapshot and serialize to camelCase
//! JSON with a `kind` tag.

use foresight_core::{
    AxisKind, ExerciseContext, Quadrant, ResponseStrategy, ScenarioId, SimulationState,
    WorkflowError, WorkflowResult,
};
use serde::Serialize;
use std::fmt;

/// Which generation operation a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Forces,
    Narrative,
    Actions,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestKind::Forces => "forces",
            RequestKind::Narrative => "narrative",
            RequestKind::Actions => "actions",
        })
    }
}

/// Ask for a fresh set of driving forces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceRequest {
    pub industry: String,
    pub organization_type: String,
    pub challenge_statement: String,
    pub modifiers: Vec<String>,
    pub strategic_question: Option<String>,
    pub max_forces: usize,
}

impl ForceRequest {
    #[must_use]
    pub fn from_state(state: &SimulationState, max_forces: usize) -> Self {
        let ExerciseContext {
            industry,
            organization_type,
            challenge_statement,
            modifiers,
        } = state.context.clone();
        let question = state.focal_issue.strategic_question.trim();
        Self {
            industry,
            organization_type,
            challenge_statement,
            modifiers,
            strategic_question: (!question.is_empty()).then(|| question.to_string()),
            max_forces,
        }
    }
}

/// One axis as seen from a particular quadrant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisBrief {
    pub force_name: String,
    pub low: String,
    pub high: String,
    /// Label of the extreme this quadrant sits at
    pub position: String,
}

/// Ask for narrative text for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeRequest {
    pub scenario_id: ScenarioId,
    pub scenario_name: String,
    pub quadrant: Quadrant,
    pub industry: String,
    pub strategic_question: String,
    pub time_horizon_years: u8,
    pub x_axis: AxisBrief,
    pub y_axis: AxisBrief,
}

impl NarrativeRequest {
    /// # Errors
    /// - `InvalidSelection` if the scenario or an axis driver is missing
    pub fn from_state(state: &SimulationState, scenario_id: &ScenarioId) -> WorkflowResult<Self> {
        let scenario = state.scenario(scenario_id).ok_or_else(|| {
            WorkflowError::invalid_selection(format!("unknown scenario: {scenario_id}"))
        })?;
        let brief = |kind: AxisKind| -> WorkflowResult<AxisBrief> {
            let axis = state
                .axis(kind)
                .ok_or_else(|| WorkflowError::invalid_selection(format!("{kind} axis has no driver")))?;
            let force = state.force(&axis.force_id).ok_or_else(|| {
                WorkflowError::invalid_selection(format!("unknown force: {}", axis.force_id))
            })?;
            let extreme = match kind {
                AxisKind::X => scenario.quadrant.x_extreme(),
                AxisKind::Y => scenario.quadrant.y_extreme(),
            };
            Ok(AxisBrief {
                force_name: force.name.clone(),
                position: axis.labels.extreme(extreme).to_string(),
                low: axis.labels.low,
                high: axis.labels.high,
            })
        };
        Ok(Self {
            scenario_id: scenario.id.clone(),
            scenario_name: scenario.name.clone(),
            quadrant: scenario.quadrant,
            industry: state.context.industry.clone(),
            strategic_question: state.focal_issue.strategic_question.clone(),
            time_horizon_years: state.focal_issue.time_horizon_years,
            x_axis: brief(AxisKind::X)?,
            y_axis: brief(AxisKind::Y)?,
        })
    }
}

/// Ask for suggested actions for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub scenario_id: ScenarioId,
    pub scenario_name: String,
    pub narrative: String,
    pub composite_score: u8,
    pub response: Option<ResponseStrategy>,
    pub risk_appetite: u8,
    pub risk_capacity: u8,
    pub existing_actions: Vec<String>,
}

impl ActionRequest {
    /// # Errors
    /// - `InvalidSelection` if the scenario is missing
    pub fn from_state(
        state: &SimulationState,
        scenario_id: &ScenarioId,
        assessment_default: u8,
    ) -> WorkflowResult<Self> {
        let scenario = state.scenario(scenario_id).ok_or_else(|| {
            WorkflowError::invalid_selection(format!("unknown scenario: {scenario_id}"))
        })?;
        Ok(Self {
            scenario_id: scenario.id.clone(),
            scenario_name: scenario.name.clone(),
            narrative: scenario.narrative.clone(),
            composite_score: state
                .assessment_or(scenario_id, assessment_default)
                .composite(),
            response: state.responses.get(scenario_id).copied(),
            risk_appetite: state.risk_profile.appetite,
            risk_capacity: state.risk_profile.capacity,
            existing_actions: state
                .actions_for(scenario_id)
                .map(|a| a.description.clone())
                .collect(),
        })
    }
}

/// Any request sent to a [`crate::TextGenerator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GenerationRequest {
    Forces(ForceRequest),
    Narrative(NarrativeRequest),
    Actions(ActionRequest),
}

impl GenerationRequest {
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            GenerationRequest::Forces(_) => RequestKind::Forces,
            GenerationRequest::Narrative(_) => RequestKind::Narrative,
            GenerationRequest::Actions(_) => RequestKind::Actions,
        }
    }
}
