use foresight_core::prelude::*;
use foresight_core::{
    ApplyOutcome, GenerationKind, ImpactAssessment, MainPhase, StoreEvent, TOTAL_STEPS,
};
use foresight_test_utils::{
    axis_drivers, completed_store, narrative_of_len, sample_forces, store_with_forces,
    store_with_matrix,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

#[test]
fn test_critical_uncertainties_feed_matrix() {
    let (store, forces) = store_with_forces();
    let top: Vec<String> = store
        .critical_uncertainties(2)
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(top, vec!["Carbon regulation", "Storage adoption"]);
    assert_eq!(store.read(|s| s.rated_force_count()), 5);

    let (x, y) = axis_drivers(&forces);
    store.select_axis_forces(&x, &y).unwrap();
    store.set_axis_labels(AxisKind::X, AxisLabels::new("Restrictive", "Permissive"));
    store.set_axis_labels(AxisKind::Y, AxisLabels::new("Slow", "Rapid"));
    let build = store.build_matrix().unwrap();
    assert_eq!(build.created, 4);
    assert_eq!(build.preserved, 0);

    let names: Vec<(Quadrant, String)> = store.read(|s| {
        s.scenarios
            .iter()
            .map(|sc| (sc.quadrant, sc.name.clone()))
            .collect()
    });
    assert_eq!(
        names,
        vec![
            (Quadrant::TopLeft, "Restrictive & Rapid".to_string()),
            (Quadrant::TopRight, "Permissive & Rapid".to_string()),
            (Quadrant::BottomLeft, "Restrictive & Slow".to_string()),
            (Quadrant::BottomRight, "Permissive & Slow".to_string()),
        ]
    );
}

#[test]
fn test_new_scenarios_get_default_assessment() {
    let store = store_with_matrix();
    let state = store.state();
    for scenario in &state.scenarios {
        assert_eq!(
            state.assessments.get(&scenario.id),
            Some(&ImpactAssessment::uniform(50))
        );
    }
}

#[test]
fn test_rebuild_with_same_axes_preserves_work() {
    let store = store_with_matrix();
    let id = store.read(|s| s.scenarios[0].id.clone());
    store
        .update_scenario(&id, ScenarioUpdate::narrative("A world of tight rules"))
        .unwrap();
    store
        .update_impact_score(&id, ImpactDimension::Urgency, 90)
        .unwrap();
    store
        .set_response_assignment(&id, ResponseStrategy::Safeguard)
        .unwrap();

    let build = store.build_matrix().unwrap();
    assert_eq!(build.preserved, 4);
    assert_eq!(build.created, 0);

    let state = store.state();
    assert_eq!(state.scenarios.len(), 4);
    let scenario = state.scenario(&id).unwrap();
    assert_eq!(scenario.narrative, "A world of tight rules");
    assert_eq!(state.assessments[&id].urgency, 90);
    assert_eq!(state.responses.get(&id), Some(&ResponseStrategy::Safeguard));
}

#[test]
fn test_relabel_renames_without_losing_narrative() {
    let store = store_with_matrix();
    let id = store.read(|s| s.scenario_in(Quadrant::TopRight).unwrap().id.clone());
    store
        .update_scenario(&id, ScenarioUpdate::narrative("kept"))
        .unwrap();
    store.set_axis_labels(AxisKind::Y, AxisLabels::new("Sluggish", "Explosive"));
    store.build_matrix().unwrap();

    let scenario = store.read(|s| s.scenario(&id).cloned()).unwrap();
    assert_eq!(scenario.name, "Permissive & Explosive");
    assert_eq!(scenario.narrative, "kept");
}

#[test]
fn test_changing_axes_resets_matrix() {
    let store = store_with_matrix();
    let forces = store.read(|s| s.forces.clone());
    let old_ids: Vec<ScenarioId> = store.read(|s| s.scenarios.iter().map(|s| s.id.clone()).collect());
    let first = old_ids[0].clone();
    store
        .add_action(ActionItem::new(first.clone(), "Lobby"))
        .unwrap();

    store
        .select_axis_forces(&forces[2].id, &forces[1].id)
        .unwrap();
    let state = store.state();
    assert!(state.scenarios.is_empty());
    assert!(state.assessments.is_empty());
    assert!(state.actions.is_empty());

    store.build_matrix().unwrap();
    let new_ids: Vec<ScenarioId> = store.read(|s| s.scenarios.iter().map(|s| s.id.clone()).collect());
    assert!(new_ids.iter().all(|id| !old_ids.contains(id)));
}

#[test]
fn test_removing_driver_resets_matrix() {
    let store = store_with_matrix();
    let x = store.read(|s| s.axes.x_force.clone()).unwrap();
    assert!(store.remove_force(&x));
    let state = store.state();
    assert!(state.axes.x_force.is_none());
    assert!(state.scenarios.is_empty());
    assert!(!store.can_advance(SubStep::Uncertainties));
}

#[test]
fn test_axis_selection_rejects_same_force() {
    let (store, forces) = store_with_forces();
    let err = store
        .select_axis_forces(&forces[0].id, &forces[0].id)
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidSelection(_)));
    assert!(store.read(|s| s.axes.x_force.is_none()));
}

#[test]
fn test_build_without_axes_fails() {
    let (store, _) = store_with_forces();
    assert!(matches!(
        store.build_matrix(),
        Err(WorkflowError::InvalidSelection(_))
    ));
}

#[test]
fn test_unknown_force_rating_is_silent_noop() {
    let (store, _) = store_with_forces();
    let before = store.state();
    assert!(!store.set_force_impact(&ForceId::from("missing"), 3));
    assert!(!store.set_force_uncertainty(&ForceId::from("missing"), 3));
    assert_eq!(store.state(), before);
}

#[test]
fn test_actions_gate_requires_every_scenario() {
    let store = store_with_matrix();
    let ids: Vec<ScenarioId> = store.read(|s| s.scenarios.iter().map(|s| s.id.clone()).collect());
    for id in &ids[..3] {
        store.add_action(ActionItem::new(id.clone(), "Hedge")).unwrap();
    }
    assert!(!store.can_advance(SubStep::Actions));
    store
        .add_action(ActionItem::new(ids[3].clone(), "Hedge"))
        .unwrap();
    assert!(store.can_advance(SubStep::Actions));
}

#[test]
fn test_action_for_unknown_scenario_rejected() {
    let store = store_with_matrix();
    let err = store
        .add_action(ActionItem::new(ScenarioId::from("nowhere"), "Hedge"))
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidSelection(_)));
    assert!(store.read(|s| s.actions.is_empty()));
}

#[test]
fn test_set_actions_is_all_or_nothing() {
    let store = store_with_matrix();
    let id = store.read(|s| s.scenarios[0].id.clone());
    let good = ActionItem::new(id, "Invest");
    let bad = ActionItem::new(ScenarioId::from("ghost"), "Divest");
    assert!(store.set_actions(vec![good, bad]).is_err());
    assert!(store.read(|s| s.actions.is_empty()));
}

#[test]
fn test_toggle_and_delete_action() {
    let store = store_with_matrix();
    let id = store.read(|s| s.scenarios[0].id.clone());
    let action = store.add_action(ActionItem::new(id, "Partner")).unwrap();
    assert_eq!(store.toggle_action_selected(&action), Some(true));
    assert_eq!(store.toggle_action_selected(&action), Some(false));
    assert!(store.delete_action(&action));
    assert_eq!(store.toggle_action_selected(&action), None);
}

#[test]
fn test_impact_score_clamped() {
    let store = store_with_matrix();
    let id = store.read(|s| s.scenarios[0].id.clone());
    assert_eq!(
        store
            .update_impact_score(&id, ImpactDimension::Probability, 250)
            .unwrap(),
        100
    );
    assert_eq!(
        store
            .update_impact_score(&id, ImpactDimension::Probability, -5)
            .unwrap(),
        0
    );
    assert!(store
        .update_impact_score(&ScenarioId::from("x"), ImpactDimension::Urgency, 10)
        .is_err());
}

// Scores default to 50, so the impact gate opens with the matrix
#[test]
fn test_impact_gate_is_weak() {
    let store = store_with_matrix();
    assert!(store.can_advance(SubStep::Impact));
}

#[test]
fn test_narrative_gate_threshold() {
    let store = store_with_matrix();
    let ids: Vec<ScenarioId> = store.read(|s| s.scenarios.iter().map(|s| s.id.clone()).collect());
    for id in &ids {
        store
            .update_scenario(id, ScenarioUpdate::narrative(narrative_of_len(50)))
            .unwrap();
    }
    assert!(!store.can_advance(SubStep::Narratives));
    store
        .update_scenario(&ids[0], ScenarioUpdate::narrative(narrative_of_len(51)))
        .unwrap();
    assert!(!store.can_advance(SubStep::Narratives));
    for id in &ids {
        store
            .update_scenario(id, ScenarioUpdate::narrative(narrative_of_len(51)))
            .unwrap();
    }
    assert!(store.can_advance(SubStep::Narratives));
}

#[test]
fn test_completed_store_opens_every_gate() {
    let store = completed_store();
    assert!(store.gate_status().iter().all(|(_, gate)| gate.is_open()));
    let playbook = store.playbook();
    assert_eq!(playbook.entries.len(), 4);
    assert_eq!(playbook.selected_actions().count(), 4);
    assert_eq!(playbook.critical_uncertainties.len(), 3);
}

#[test]
fn test_walk_every_step_with_advance() {
    let store = completed_store();
    let mut visited = vec![store.current_step()];
    while let Some(step) = store.advance() {
        visited.push(step);
    }
    assert_eq!(visited.len(), TOTAL_STEPS);
    assert_eq!(store.current_step(), SubStep::Report);
    let completed = store.read(|s| s.progress.completed_main_phases.clone());
    assert_eq!(completed.into_iter().collect::<Vec<_>>(), MainPhase::ALL.to_vec());
}

#[test]
fn test_reset_restores_initial_state() {
    let store = completed_store();
    store.set_current_step(SubStep::Report);
    store.reset_simulation();
    assert_eq!(store.state(), foresight_core::SimulationState::new());
    assert_eq!(store.current_step(), SubStep::PreRead);
}

#[test]
fn test_subscribers_observe_matrix_build() {
    let (store, forces) = store_with_forces();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    store.subscribe(move |change| sink.lock().unwrap().push(change.event.clone()));

    let (x, y) = axis_drivers(&forces);
    store.select_axis_forces(&x, &y).unwrap();
    store.build_matrix().unwrap();

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            StoreEvent::AxesSelected {
                matrix_reset: false
            },
            StoreEvent::MatrixBuilt {
                created: 4,
                preserved: 0
            },
        ]
    );
}

#[test]
fn test_stale_force_generation_is_discarded() {
    let store = WorkflowStore::new();
    store.set_current_step(SubStep::Forces);
    let first = store.begin_generation(GenerationKind::Forces).unwrap();
    let second = store.begin_generation(GenerationKind::Forces).unwrap();

    let newer = sample_forces();
    let older = vec![Force::new("Outdated", "", PestCategory::Social)];

    assert_eq!(
        store.apply_generated_forces(&second, newer.clone()).unwrap(),
        ApplyOutcome::Applied
    );
    assert_eq!(
        store.apply_generated_forces(&first, older).unwrap(),
        ApplyOutcome::Discarded
    );
    assert_eq!(store.read(|s| s.forces.clone()), newer);
}

#[test]
fn test_generation_discarded_after_navigation() {
    let store = store_with_matrix();
    store.set_current_step(SubStep::Narratives);
    let id = store.read(|s| s.scenarios[0].id.clone());
    let ticket = store
        .begin_generation(GenerationKind::Narrative(id.clone()))
        .unwrap();
    store.set_current_step(SubStep::Impact);
    assert!(!store.is_current(&ticket));
    assert_eq!(
        store.apply_generated_narrative(&ticket, "late").unwrap(),
        ApplyOutcome::Discarded
    );
    assert_eq!(store.read(|s| s.scenario(&id).unwrap().narrative.clone()), "");
}

#[test]
fn test_generation_discarded_after_reset() {
    let store = WorkflowStore::new();
    let ticket = store.begin_generation(GenerationKind::Forces).unwrap();
    store.reset_simulation();
    assert_eq!(
        store.apply_generated_forces(&ticket, sample_forces()).unwrap(),
        ApplyOutcome::Discarded
    );
    assert!(store.read(|s| s.forces.is_empty()));
}

#[test]
fn test_generation_discarded_after_round_trip_navigation() {
    let store = WorkflowStore::new();
    store.set_current_step(SubStep::Forces);
    let ticket = store.begin_generation(GenerationKind::Forces).unwrap();
    store.set_current_step(SubStep::Uncertainties);
    store.set_current_step(SubStep::Forces);
    assert!(!store.is_current(&ticket));
    assert_eq!(
        store.apply_generated_forces(&ticket, sample_forces()).unwrap(),
        ApplyOutcome::Discarded
    );
    assert!(store.read(|s| s.forces.is_empty()));
}

#[test]
fn test_generated_forces_truncated_to_limit() {
    let store = WorkflowStore::with_config(WorkflowConfig::new().with_max_generated_forces(2));
    let ticket = store.begin_generation(GenerationKind::Forces).unwrap();
    store.apply_generated_forces(&ticket, sample_forces()).unwrap();
    assert_eq!(store.read(|s| s.forces.len()), 2);
}

#[test]
fn test_generated_actions_attach_to_ticket_scenario() {
    let store = store_with_matrix();
    store.set_current_step(SubStep::Actions);
    let id = store.read(|s| s.scenarios[1].id.clone());
    let ticket = store
        .begin_generation(GenerationKind::Actions(id.clone()))
        .unwrap();
    let drafted = vec![
        ActionItem::new(ScenarioId::from("placeholder"), "Build reserves"),
        ActionItem::new(ScenarioId::from("placeholder"), "Diversify suppliers"),
    ];
    assert_eq!(
        store.apply_generated_actions(&ticket, drafted).unwrap(),
        ApplyOutcome::Applied
    );
    assert_eq!(store.read(|s| s.actions_for(&id).count()), 2);
}

#[test]
fn test_removing_scenario_closes_matrix_gate() {
    let store = completed_store();
    assert!(store.can_advance(SubStep::Matrix));
    let id = store.read(|s| s.scenarios[0].id.clone());

    assert!(store.remove_scenario(&id));
    assert!(!store.can_advance(SubStep::Matrix));
    let state = store.state();
    assert_eq!(state.scenarios.len(), 3);
    assert!(!state.assessments.contains_key(&id));
    assert!(!state.responses.contains_key(&id));
    assert_eq!(state.actions_for(&id).count(), 0);
    assert!(!store.remove_scenario(&id));
}

#[test]
fn test_responses_gate_requires_every_scenario() {
    let store = store_with_matrix();
    let ids: Vec<ScenarioId> = store.read(|s| s.scenarios.iter().map(|s| s.id.clone()).collect());
    for id in &ids[..3] {
        store
            .set_response_assignment(id, ResponseStrategy::Safeguard)
            .unwrap();
    }
    assert!(!store.can_advance(SubStep::Responses));

    store
        .set_response_assignment(&ids[3], ResponseStrategy::PriorityAction)
        .unwrap();
    assert!(store.can_advance(SubStep::Responses));

    assert!(store.clear_response_assignment(&ids[0]));
    assert!(!store.can_advance(SubStep::Responses));
}
