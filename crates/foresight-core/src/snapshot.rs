//! Whole-state snapshots for external persistence
//!
//! A [`Snapshot`] wraps the entire [`SimulationState`] with a format version.
//! Restoring validates every invariant first and rejects the snapshot as a
//! whole; nothing is partially loaded.

use crate::error::SnapshotError;
use crate::matrix::scenario_id_for;
use crate::state::SimulationState;
use crate::types::{Quadrant, RATING_MAX, SCORE_MAX};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable capture of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub captured_at: DateTime<Utc>,
    pub state: SimulationState,
}

impl Snapshot {
    /// Capture a state now
    #[must_use]
    pub fn capture(state: SimulationState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            captured_at: Utc::now(),
            state,
        }
    }

    /// Encode as pretty JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Parse(e.to_string()))
    }

    /// Decode and validate
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self =
            serde_json::from_str(text).map_err(|e| SnapshotError::Parse(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check version and state invariants
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        validate_state(&self.state)
    }
}

fn unique<'a, T, I>(kind: &'static str, ids: I) -> Result<HashSet<&'a T>, SnapshotError>
where
    T: Eq + Hash + ToString + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SnapshotError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(seen)
}

fn in_range(field: &'static str, value: u8, max: u8) -> Result<(), SnapshotError> {
    if value > max {
        return Err(SnapshotError::OutOfRange { field, value, max });
    }
    Ok(())
}

fn dangling(kind: &'static str, id: &impl ToString) -> SnapshotError {
    SnapshotError::DanglingReference {
        kind,
        id: id.to_string(),
    }
}

/// Check every entity invariant of a state
pub fn validate_state(state: &SimulationState) -> Result<(), SnapshotError> {
    let force_ids = unique("force", state.forces.iter().map(|f| &f.id))?;
    for force in &state.forces {
        in_range("force.impact", force.impact, RATING_MAX)?;
        in_range("force.uncertainty", force.uncertainty, RATING_MAX)?;
    }

    for driver in [&state.axes.x_force, &state.axes.y_force].into_iter().flatten() {
        if !force_ids.contains(driver) {
            return Err(dangling("axis", driver));
        }
    }
    if state.axes.x_force.is_some() && state.axes.x_force == state.axes.y_force {
        return Err(SnapshotError::AxisSelection(
            "both axes driven by the same force".to_string(),
        ));
    }

    match state.scenarios.len() {
        0 | 4 => {}
        n => return Err(SnapshotError::ScenarioCount(n)),
    }
    let scenario_ids = unique("scenario", state.scenarios.iter().map(|s| &s.id))?;
    let mut quadrants: HashSet<Quadrant> = HashSet::new();
    for scenario in &state.scenarios {
        if !quadrants.insert(scenario.quadrant) {
            return Err(SnapshotError::DuplicateQuadrant(scenario.quadrant));
        }
    }
    if let (Some(x), Some(y)) = (&state.axes.x_force, &state.axes.y_force) {
        for scenario in &state.scenarios {
            let expected = scenario_id_for(x, y, scenario.quadrant);
            if scenario.id != expected {
                return Err(SnapshotError::ScenarioIdMismatch {
                    id: scenario.id.to_string(),
                    quadrant: scenario.quadrant,
                    expected: expected.to_string(),
                });
            }
        }
    } else if !state.scenarios.is_empty() {
        return Err(SnapshotError::AxisSelection(
            "scenarios present without two axis drivers".to_string(),
        ));
    }

    for (id, assessment) in &state.assessments {
        if !scenario_ids.contains(id) {
            return Err(dangling("assessment", id));
        }
        in_range("assessment.probability", assessment.probability, SCORE_MAX)?;
        in_range("assessment.repercussion", assessment.repercussion, SCORE_MAX)?;
        in_range("assessment.urgency", assessment.urgency, SCORE_MAX)?;
        in_range(
            "assessment.strategicDisruption",
            assessment.strategic_disruption,
            SCORE_MAX,
        )?;
    }
    if let Some(id) = state.responses.keys().find(|id| !scenario_ids.contains(id)) {
        return Err(dangling("response", id));
    }

    in_range("riskProfile.appetite", state.risk_profile.appetite, RATING_MAX)?;
    in_range("riskProfile.capacity", state.risk_profile.capacity, RATING_MAX)?;

    unique("action", state.actions.iter().map(|a| &a.id))?;
    if let Some(action) = state
        .actions
        .iter()
        .find(|a| !scenario_ids.contains(&a.scenario_id))
    {
        return Err(dangling("action", &action.scenario_id));
    }

    unique("research note", state.research_notes.iter().map(|n| &n.id))?;
    for note in &state.research_notes {
        if let Some(id) = note.linked_force_ids.iter().find(|id| !force_ids.contains(id)) {
            return Err(dangling("research note", id));
        }
        if let Some(id) = note
            .linked_scenario_ids
            .iter()
            .find(|id| !scenario_ids.contains(id))
        {
            return Err(dangling("research note", id));
        }
    }

    Ok(())
}
