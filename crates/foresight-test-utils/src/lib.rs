//! Testing utilities for the foresight workspace
//!
//! Shared fixtures: a sample force set, and stores pre-populated up to a
//! given point of the exercise.

#![allow(missing_docs)]

use foresight_core::{
    ActionItem, AxisKind, AxisLabels, ExerciseContext, FocalIssue, Force, ForceId,
    PestCategory, ResponseStrategy, RiskProfile, ScenarioUpdate, WorkflowStore,
};

pub const X_LOW: &str = "Restrictive";
pub const X_HIGH: &str = "Permissive";
pub const Y_LOW: &str = "Slow";
pub const Y_HIGH: &str = "Rapid";

pub fn sample_context() -> ExerciseContext {
    ExerciseContext::new(
        "Energy",
        "Regional utility",
        "Decarbonization is reshaping demand",
    )
    .with_modifier("regulated market")
}

pub fn sample_focal_issue() -> FocalIssue {
    FocalIssue::new("How should we position our grid business by 2035?", 10)
}

/// Six forces; the first two are the only 5/5 critical uncertainties
pub fn sample_forces() -> Vec<Force> {
    vec![
        Force::new(
            "Carbon regulation",
            "Stringency of emissions policy",
            PestCategory::Political,
        )
        .rated(5, 5),
        Force::new(
            "Storage adoption",
            "Pace of battery deployment",
            PestCategory::Technological,
        )
        .rated(5, 5),
        Force::new("Interest rates", "Cost of capital", PestCategory::Economic).rated(4, 3),
        Force::new("Public trust", "Acceptance of new infrastructure", PestCategory::Social)
            .rated(3, 2),
        Force::new("Extreme weather", "Frequency of grid stress events", PestCategory::Environmental)
            .rated(4, 1),
        Force::new("Permitting law", "Speed of siting approvals", PestCategory::Legal),
    ]
}

/// Narrative of exactly `chars` characters
pub fn narrative_of_len(chars: usize) -> String {
    "n".repeat(chars)
}

pub fn store_with_forces() -> (WorkflowStore, Vec<Force>) {
    let store = WorkflowStore::new();
    store.set_context(sample_context());
    store.set_focal_issue(sample_focal_issue());
    let forces = sample_forces();
    store
        .set_forces(forces.clone())
        .expect("sample forces have unique ids");
    (store, forces)
}

/// Ids of the two sample critical uncertainties
pub fn axis_drivers(forces: &[Force]) -> (ForceId, ForceId) {
    (forces[0].id.clone(), forces[1].id.clone())
}

/// Store with axes selected and labeled and the matrix built
pub fn store_with_matrix() -> WorkflowStore {
    let (store, forces) = store_with_forces();
    let (x, y) = axis_drivers(&forces);
    store.select_axis_forces(&x, &y).expect("distinct drivers");
    store.set_axis_labels(AxisKind::X, AxisLabels::new(X_LOW, X_HIGH));
    store.set_axis_labels(AxisKind::Y, AxisLabels::new(Y_LOW, Y_HIGH));
    store.build_matrix().expect("axes are complete");
    store
}

/// Store with every gate open
pub fn completed_store() -> WorkflowStore {
    let store = store_with_matrix();
    let ids: Vec<_> = store.read(|s| s.scenarios.iter().map(|s| s.id.clone()).collect());
    for id in &ids {
        store
            .update_scenario(id, ScenarioUpdate::narrative(narrative_of_len(80)))
            .expect("scenario exists");
        store
            .set_response_assignment(id, ResponseStrategy::Monitor)
            .expect("scenario exists");
        store
            .add_action(ActionItem::new(id.clone(), "Run a pilot").selected())
            .expect("scenario exists");
    }
    store.set_risk_profile(RiskProfile::new(3, 4));
    store
}
