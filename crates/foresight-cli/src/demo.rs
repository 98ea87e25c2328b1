//! Scripted walkthrough
//!
//! Drives a full exercise from pre-read to report against canned generator
//! replies, going through the same gates a user would.

use anyhow::{anyhow, ensure, Context};
use foresight_core::{
    ApplyOutcome, AxisKind, AxisLabels, ExerciseContext, FocalIssue, ImpactDimension,
    ResponseStrategy, RiskProfile, ScenarioId, SubStep, WorkflowConfig, WorkflowStore,
};
use foresight_generation::{GenerationSession, RequestKind, ScriptedGenerator};
use futures::future::join_all;
use std::sync::Arc;

const FORCES: &str = r#"```json
[
  {"name": "Carbon regulation", "description": "Stringency of emissions policy", "category": "P"},
  {"name": "Storage adoption", "description": "Pace of grid-scale battery deployment", "category": "T"},
  {"name": "Interest rates", "description": "Cost of capital for long-lived assets", "category": "E"},
  {"name": "Public trust", "description": "Acceptance of new transmission lines", "category": "S"},
  {"name": "Extreme weather", "description": "Frequency of grid stress events", "category": "En"},
  {"name": "Permitting reform", "description": "Speed of siting approvals", "category": "L"}
]
```"#;

/// (impact, uncertainty) per generated force, in order
const RATINGS: [(u8, u8); 6] = [(5, 5), (5, 4), (4, 3), (3, 2), (4, 2), (3, 3)];

/// One narrative per quadrant, TL, TR, BL, BR
const NARRATIVES: [&str; 4] = [
    "Tight carbon rules arrive before storage is cheap. Utilities ration capacity, lean on gas peakers and pass costs to customers.",
    "Light-touch policy meets a storage boom. Distributed batteries erode the central grid and new entrants capture the margin.",
    "Strict rules and slow technology stall the transition. Reliability suffers and regulators lean on incumbents to keep the lights on.",
    "Neither policy nor technology moves much. The business runs as usual while slow structural decline sets in.",
];

const ACTIONS: [&str; 4] = [
    r#"[{"description": "Secure long-term gas hedges", "timeline": "immediate", "budgetRange": "significant", "owner": "finance"},
        {"description": "Launch demand-response programme", "timeline": "short-term", "owner": "operations"}]"#,
    r#"[{"description": "Partner with storage developers", "timeline": "medium-term", "owner": "strategy"}]"#,
    r#"[{"description": "Harden critical substations", "timeline": "short-term", "budgetRange": "major", "owner": "operations"}]"#,
    r#"[{"description": "Track storage cost curves quarterly", "timeline": "long-term", "budgetRange": "minimal"}]"#,
];

fn scripted_generator() -> ScriptedGenerator {
    let generator = ScriptedGenerator::new().with_response(RequestKind::Forces, FORCES);
    for text in NARRATIVES {
        generator.push(RequestKind::Narrative, text);
    }
    for text in ACTIONS {
        generator.push(RequestKind::Actions, text);
    }
    generator
}

/// Response choice by composite impact score
fn strategy_for(composite: u8) -> ResponseStrategy {
    match composite {
        70.. => ResponseStrategy::PriorityAction,
        55..=69 => ResponseStrategy::Safeguard,
        40..=54 => ResponseStrategy::Monitor,
        _ => ResponseStrategy::Pause,
    }
}

fn advance(store: &WorkflowStore) -> anyhow::Result<SubStep> {
    store.advance().ok_or_else(|| {
        let step = store.current_step();
        let gate = store.read(|s| store.gates().evaluate(step, s));
        anyhow!("walkthrough blocked at {step}: {gate:?}")
    })
}

fn scenario_ids(store: &WorkflowStore) -> Vec<ScenarioId> {
    store.read(|s| s.scenarios.iter().map(|sc| sc.id.clone()).collect())
}

/// Run the whole exercise and return the finished store
pub async fn run_walkthrough(config: WorkflowConfig) -> anyhow::Result<Arc<WorkflowStore>> {
    let store = Arc::new(WorkflowStore::with_config(config));
    let session = GenerationSession::new(Arc::clone(&store), Arc::new(scripted_generator()));

    // Discover
    advance(&store)?;
    store.set_context(
        ExerciseContext::new(
            "Energy",
            "Regional utility",
            "Decarbonization is reshaping demand",
        )
        .with_modifier("regulated market"),
    );
    advance(&store)?;
    store.set_focal_issue(FocalIssue::new(
        "How should we position our grid business by 2035?",
        10,
    ));
    advance(&store)?;
    let outcome = session
        .regenerate_forces()
        .await
        .context("generating forces")?;
    ensure!(outcome == ApplyOutcome::Applied, "force generation was discarded");
    let forces = store.read(|s| s.forces.clone());
    for (force, (impact, uncertainty)) in forces.iter().zip(RATINGS) {
        store.set_force_impact(&force.id, impact);
        store.set_force_uncertainty(&force.id, uncertainty);
    }
    advance(&store)?;

    // Design
    let critical = store.critical_uncertainties(2);
    let [x, y] = critical.as_slice() else {
        return Err(anyhow!("need two rated forces, found {}", critical.len()));
    };
    store.select_axis_forces(&x.id, &y.id)?;
    advance(&store)?;
    store.set_axis_labels(AxisKind::X, AxisLabels::new("Restrictive", "Permissive"));
    store.set_axis_labels(AxisKind::Y, AxisLabels::new("Slow", "Rapid"));
    advance(&store)?;
    store.build_matrix()?;
    advance(&store)?;

    // Develop
    let ids = scenario_ids(&store);
    for outcome in join_all(ids.iter().map(|id| session.suggest_narrative(id))).await {
        outcome.context("generating narrative")?;
    }
    advance(&store)?;
    for (id, (probability, urgency)) in ids.iter().zip([(80, 85), (60, 55), (45, 70), (30, 20)]) {
        store.update_impact_score(id, ImpactDimension::Probability, probability)?;
        store.update_impact_score(id, ImpactDimension::Urgency, urgency)?;
    }
    advance(&store)?;
    store.set_risk_profile(RiskProfile::new(2, 4));
    advance(&store)?;

    // Decide
    let playbook = store.playbook();
    for entry in &playbook.entries {
        store.set_response_assignment(&entry.scenario_id, strategy_for(entry.composite_score))?;
    }
    advance(&store)?;
    for outcome in join_all(ids.iter().map(|id| session.suggest_actions(id))).await {
        outcome.context("generating actions")?;
    }
    for id in &ids {
        let first = store.read(|s| s.actions_for(id).next().map(|a| a.id.clone()));
        if let Some(action) = first {
            store.toggle_action_selected(&action);
        }
    }
    advance(&store)?;

    tracing::info!(revision = store.revision(), "walkthrough complete");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foresight_core::Quadrant;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn walkthrough_reaches_report() {
        let store = run_walkthrough(WorkflowConfig::default()).await.unwrap();
        assert_eq!(store.current_step(), SubStep::Report);
        assert!(store.gate_status().iter().all(|(_, g)| g.is_open()));

        let playbook = store.playbook();
        assert_eq!(playbook.entries.len(), 4);
        assert_eq!(playbook.selected_actions().count(), 4);
        let top = playbook.entry(Quadrant::TopLeft).unwrap();
        assert_eq!(top.name, "Restrictive & Rapid");
        assert!(top.narrative.starts_with("Tight carbon rules"));
    }

    #[test]
    fn strategy_thresholds() {
        assert_eq!(strategy_for(90), ResponseStrategy::PriorityAction);
        assert_eq!(strategy_for(60), ResponseStrategy::Safeguard);
        assert_eq!(strategy_for(50), ResponseStrategy::Monitor);
        assert_eq!(strategy_for(10), ResponseStrategy::Pause);
    }
}
