//! Workflow store
//!
//! The single mutable container for one exercise run. Owns the
//! [`SimulationState`], applies every mutation atomically under one lock,
//! and notifies subscribers after the lock is released so they always read a
//! fully updated state.
//!
//! # Atomicity
//! Each operation validates its input before touching state. A returned
//! error means nothing changed.

use crate::config::WorkflowConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::gating::{Gate, GateRules};
use crate::matrix;
use crate::registry::{MainPhase, SubStep, TOTAL_STEPS};
use crate::report::{build_playbook, Playbook};
use crate::snapshot::Snapshot;
use crate::state::SimulationState;
use crate::ticket::{ApplyOutcome, GenerationKind, GenerationTicket, TicketLedger};
use crate::types::{
    ActionId, ActionItem, AxisKind, AxisLabels, ExerciseContext, FocalIssue, Force, ForceId,
    ImpactAssessment, ImpactDimension, NoteId, PestCategory, ResearchNote, ResponseStrategy,
    RiskProfile, ScenarioId, ScenarioUpdate, RATING_MAX,
};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What changed in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Whole state reinitialized
    Reset,
    /// Navigation moved
    StepChanged(SubStep),
    /// A main phase was marked complete
    PhaseCompleted(MainPhase),
    /// Exercise context edited
    ContextChanged,
    /// Focal issue edited
    FocalIssueChanged,
    /// Force set replaced
    ForcesReplaced { count: usize, matrix_reset: bool },
    /// User-authored force added
    ForceAdded(ForceId),
    /// A force's ratings changed
    ForceUpdated(ForceId),
    /// A force was removed
    ForceRemoved { id: ForceId, matrix_reset: bool },
    /// Axis drivers changed
    AxesSelected { matrix_reset: bool },
    /// Axis labels edited
    AxisLabelsChanged(AxisKind),
    /// Matrix (re)built
    MatrixBuilt { created: usize, preserved: usize },
    /// Scenario fields edited
    ScenarioUpdated(ScenarioId),
    /// Scenario and its dependents removed
    ScenarioRemoved(ScenarioId),
    /// One impact dimension changed
    ImpactScoreChanged {
        scenario_id: ScenarioId,
        dimension: ImpactDimension,
        value: u8,
    },
    /// Risk profile edited
    RiskProfileChanged,
    /// Response strategy assigned or cleared
    ResponseChanged(ScenarioId),
    /// Action list changed
    ActionsChanged,
    /// Research notes changed
    ResearchNotesChanged,
    /// State replaced from a snapshot
    Restored,
}

/// Event plus the state revision it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub revision: u64,
    pub event: StoreEvent,
}

/// Handle for removing a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&StoreChange) + Send + Sync>;

/// Result of a matrix build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixBuild {
    /// Scenarios created fresh
    pub created: usize,
    /// Scenarios kept from the previous build
    pub preserved: usize,
}

#[derive(Debug, Default)]
struct Inner {
    state: SimulationState,
    revision: u64,
    tickets: TicketLedger,
}

/// Observable container for one exercise run
pub struct WorkflowStore {
    config: WorkflowConfig,
    gates: GateRules,
    inner: RwLock<Inner>,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl WorkflowStore {
    /// Create a store with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorkflowConfig::default())
    }

    /// Create a store with custom configuration
    #[must_use]
    pub fn with_config(config: WorkflowConfig) -> Self {
        Self {
            gates: GateRules::new(&config),
            config,
            inner: RwLock::new(Inner::default()),
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    // ── Subscriptions ──────────────────────────────────────────

    /// Register a callback invoked after every state change
    pub fn subscribe(&self, f: impl Fn(&StoreChange) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(f)));
        id
    }

    /// Remove a callback; false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    fn publish(&self, change: &StoreChange) {
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();
        for subscriber in subscribers {
            subscriber(change);
        }
    }

    fn apply<T>(&self, op: impl FnOnce(&mut Inner) -> (T, Option<StoreEvent>)) -> T {
        let (value, change) = {
            let mut inner = self.inner.write();
            let (value, event) = op(&mut inner);
            (value, event.map(|event| inner.record(event)))
        };
        if let Some(change) = change {
            self.publish(&change);
        }
        value
    }

    fn try_apply<T>(
        &self,
        op: impl FnOnce(&mut Inner) -> WorkflowResult<(T, Option<StoreEvent>)>,
    ) -> WorkflowResult<T> {
        let (value, change) = {
            let mut inner = self.inner.write();
            let (value, event) = op(&mut inner)?;
            (value, event.map(|event| inner.record(event)))
        };
        if let Some(change) = change {
            self.publish(&change);
        }
        Ok(value)
    }

    // ── Lifecycle & navigation ─────────────────────────────────

    /// Reinitialize every collection and clear progress
    ///
    /// Outstanding generation requests become stale.
    pub fn reset_simulation(&self) {
        self.apply(|inner| {
            inner.state = SimulationState::new();
            inner.tickets.invalidate_all();
            ((), Some(StoreEvent::Reset))
        });
        tracing::info!("simulation reset");
    }

    /// Record the navigation position; does not consult gates
    pub fn set_current_step(&self, step: SubStep) {
        self.apply(|inner| {
            if inner.state.progress.current_step == step {
                return ((), None);
            }
            inner.state.progress.current_step = step;
            inner.tickets.navigated();
            ((), Some(StoreEvent::StepChanged(step)))
        });
        tracing::debug!(step = %step, "current step changed");
    }

    /// Move past the current step if its gate is open
    ///
    /// Completes the enclosing phase when leaving its last step. Returns the
    /// new step, or `None` if the gate is closed or the pipeline is finished.
    pub fn advance(&self) -> Option<SubStep> {
        let gates = self.gates;
        let moved = self.apply(|inner| {
            let current = inner.state.progress.current_step;
            if !gates.can_advance(current, &inner.state) {
                return (None, None);
            }
            let phase_closed = current.closes_phase()
                && inner
                    .state
                    .progress
                    .completed_main_phases
                    .insert(current.phase());
            match current.next() {
                Some(next) => {
                    inner.state.progress.current_step = next;
                    inner.tickets.navigated();
                    (Some(next), Some(StoreEvent::StepChanged(next)))
                }
                None => (
                    None,
                    phase_closed.then_some(StoreEvent::PhaseCompleted(current.phase())),
                ),
            }
        });
        if moved.is_none() {
            tracing::debug!("advance blocked");
        }
        moved
    }

    /// Step back one sub-step; `None` at the start
    pub fn go_back(&self) -> Option<SubStep> {
        let moved = self.apply(|inner| match inner.state.progress.current_step.previous() {
            Some(previous) => {
                inner.state.progress.current_step = previous;
                inner.tickets.navigated();
                (Some(previous), Some(StoreEvent::StepChanged(previous)))
            }
            None => (None, None),
        });
        match moved {
            Some(step) => tracing::debug!(step = %step, "stepped back"),
            None => tracing::debug!("already at first step"),
        }
        moved
    }

    /// Mark a main phase as completed
    pub fn complete_main_phase(&self, phase: MainPhase) {
        self.apply(|inner| {
            let fresh = inner.state.progress.completed_main_phases.insert(phase);
            ((), fresh.then_some(StoreEvent::PhaseCompleted(phase)))
        });
        tracing::debug!(phase = %phase, "phase completed");
    }

    // ── Discover ───────────────────────────────────────────────

    /// Replace the exercise context
    pub fn set_context(&self, context: ExerciseContext) {
        self.apply(|inner| {
            inner.state.context = context;
            ((), Some(StoreEvent::ContextChanged))
        });
        tracing::debug!("exercise context updated");
    }

    /// Replace the focal issue
    pub fn set_focal_issue(&self, focal_issue: FocalIssue) {
        self.apply(|inner| {
            inner.state.focal_issue = focal_issue;
            ((), Some(StoreEvent::FocalIssueChanged))
        });
        tracing::debug!("focal issue updated");
    }

    /// Replace the whole force set
    ///
    /// Ratings are clamped to the scale. If an axis driver disappears, that
    /// axis is cleared and the matrix is reset.
    ///
    /// # Errors
    /// - `InvalidSelection` if two forces share an id
    pub fn set_forces(&self, forces: Vec<Force>) -> WorkflowResult<()> {
        let count = forces.len();
        let matrix_reset = self.try_apply(|inner| {
            let matrix_reset = inner.state.replace_forces(forces)?;
            Ok((
                matrix_reset,
                Some(StoreEvent::ForcesReplaced {
                    count,
                    matrix_reset,
                }),
            ))
        })
        .map_err(|err| {
            tracing::warn!(error = %err, "rejected force set");
            err
        })?;
        tracing::debug!(count, matrix_reset, "forces replaced");
        Ok(())
    }

    /// Add a user-authored force
    pub fn add_custom_force(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        category: PestCategory,
    ) -> ForceId {
        let force = Force::new(name, description, category).custom();
        let id = force.id.clone();
        self.apply(|inner| {
            inner.state.forces.push(force);
            ((), Some(StoreEvent::ForceAdded(id.clone())))
        });
        tracing::debug!(force_id = %id, "custom force added");
        id
    }

    /// Remove a force; no-op (false) if unknown
    pub fn remove_force(&self, id: &ForceId) -> bool {
        let outcome = self.apply(|inner| match inner.state.remove_force(id) {
            Some(matrix_reset) => (
                Some(matrix_reset),
                Some(StoreEvent::ForceRemoved {
                    id: id.clone(),
                    matrix_reset,
                }),
            ),
            None => (None, None),
        });
        match outcome {
            Some(matrix_reset) => tracing::debug!(force_id = %id, matrix_reset, "force removed"),
            None => tracing::debug!(force_id = %id, "ignoring removal of unknown force"),
        }
        outcome.is_some()
    }

    /// Set a force's impact rating (0..=5); no-op (false) if unknown
    pub fn set_force_impact(&self, id: &ForceId, value: u8) -> bool {
        self.rate_force(id, |force| force.impact = value.min(RATING_MAX))
    }

    /// Set a force's uncertainty rating (0..=5); no-op (false) if unknown
    pub fn set_force_uncertainty(&self, id: &ForceId, value: u8) -> bool {
        self.rate_force(id, |force| force.uncertainty = value.min(RATING_MAX))
    }

    fn rate_force(&self, id: &ForceId, rate: impl FnOnce(&mut Force)) -> bool {
        let applied = self.apply(|inner| match inner.state.force_mut(id) {
            Some(force) => {
                rate(force);
                (true, Some(StoreEvent::ForceUpdated(id.clone())))
            }
            None => (false, None),
        });
        if !applied {
            tracing::debug!(force_id = %id, "ignoring rating for unknown force");
        }
        applied
    }

    // ── Design ─────────────────────────────────────────────────

    /// Choose the two critical uncertainties driving the matrix
    ///
    /// Choosing a different pair than before resets the matrix.
    ///
    /// # Errors
    /// - `InvalidSelection` if the ids are equal or not in the force set
    pub fn select_axis_forces(&self, x: &ForceId, y: &ForceId) -> WorkflowResult<()> {
        if x == y {
            tracing::warn!(force_id = %x, "rejected axis selection with duplicate driver");
            return Err(WorkflowError::invalid_selection(format!(
                "x and y axes must use different forces (both {x})"
            )));
        }
        let matrix_reset = self.try_apply(|inner| {
            for id in [x, y] {
                if inner.state.force(id).is_none() {
                    tracing::warn!(force_id = %id, "rejected axis selection with unknown driver");
                    return Err(WorkflowError::invalid_selection(format!(
                        "unknown force: {id}"
                    )));
                }
            }
            let axes = &inner.state.axes;
            if axes.x_force.as_ref() == Some(x) && axes.y_force.as_ref() == Some(y) {
                return Ok((false, None));
            }
            inner.state.axes.x_force = Some(x.clone());
            inner.state.axes.y_force = Some(y.clone());
            let matrix_reset = inner.state.clear_matrix() > 0;
            Ok((matrix_reset, Some(StoreEvent::AxesSelected { matrix_reset })))
        })?;
        tracing::debug!(x = %x, y = %y, matrix_reset, "axis drivers selected");
        Ok(())
    }

    /// Replace the extreme labels of one axis
    pub fn set_axis_labels(&self, kind: AxisKind, labels: AxisLabels) {
        self.apply(|inner| {
            *inner.state.axes.labels_mut(kind) = labels;
            ((), Some(StoreEvent::AxisLabelsChanged(kind)))
        });
        tracing::debug!(axis = %kind, "axis labels updated");
    }

    /// Derive the four quadrant scenarios from the current axes
    ///
    /// Scenarios whose identity is unchanged keep their narrative,
    /// signposts, assessment, response and actions; only their generated
    /// name is refreshed from the current labels. Scenarios no longer part
    /// of the matrix are removed with their dependents.
    ///
    /// # Errors
    /// - `InvalidSelection` if either axis has no driver, or drivers coincide
    pub fn build_matrix(&self) -> WorkflowResult<MatrixBuild> {
        let assessment_default = self.config.assessment_default;
        let build = self.try_apply(|inner| {
            let state = &mut inner.state;
            let x = state
                .axis(AxisKind::X)
                .ok_or_else(|| WorkflowError::invalid_selection("x axis has no driver"))?;
            let y = state
                .axis(AxisKind::Y)
                .ok_or_else(|| WorkflowError::invalid_selection("y axis has no driver"))?;
            for axis in [&x, &y] {
                if state.force(&axis.force_id).is_none() {
                    return Err(WorkflowError::invalid_selection(format!(
                        "axis driver {} is not in the force set",
                        axis.force_id
                    )));
                }
            }
            let derived = matrix::derive_scenarios(&x, &y)?;

            let derived_ids: HashSet<&ScenarioId> = derived.iter().map(|s| &s.id).collect();
            let stale: Vec<ScenarioId> = state
                .scenarios
                .iter()
                .filter(|s| !derived_ids.contains(&s.id))
                .map(|s| s.id.clone())
                .collect();
            for id in &stale {
                state.remove_scenario_cascade(id);
            }

            let mut build = MatrixBuild {
                created: 0,
                preserved: 0,
            };
            let mut next = Vec::with_capacity(derived.len());
            for fresh in derived {
                let scenario = match state.scenario(&fresh.id) {
                    Some(existing) => {
                        build.preserved += 1;
                        let mut kept = existing.clone();
                        kept.name = fresh.name;
                        kept
                    }
                    None => {
                        build.created += 1;
                        fresh
                    }
                };
                state
                    .assessments
                    .entry(scenario.id.clone())
                    .or_insert_with(|| ImpactAssessment::uniform(assessment_default));
                next.push(scenario);
            }
            state.scenarios = next;

            Ok((
                build,
                Some(StoreEvent::MatrixBuilt {
                    created: build.created,
                    preserved: build.preserved,
                }),
            ))
        })
        .map_err(|err| {
            tracing::warn!(error = %err, "matrix build rejected");
            err
        })?;
        tracing::info!(
            created = build.created,
            preserved = build.preserved,
            "scenario matrix built"
        );
        Ok(build)
    }

    // ── Develop ────────────────────────────────────────────────

    /// Edit a scenario's name, narrative or signposts
    ///
    /// # Errors
    /// - `InvalidSelection` if the scenario does not exist
    pub fn update_scenario(&self, id: &ScenarioId, update: ScenarioUpdate) -> WorkflowResult<()> {
        self.try_apply(|inner| {
            let scenario = inner
                .state
                .scenario_mut(id)
                .ok_or_else(|| WorkflowError::invalid_selection(format!("unknown scenario: {id}")))?;
            update.apply_to(scenario);
            Ok(((), Some(StoreEvent::ScenarioUpdated(id.clone()))))
        })
        .map_err(|err| rejected(id, err))?;
        tracing::debug!(scenario_id = %id, "scenario updated");
        Ok(())
    }

    /// Remove a scenario together with its assessment, response and actions
    ///
    /// Not part of the normal flow; false if unknown.
    pub fn remove_scenario(&self, id: &ScenarioId) -> bool {
        let removed = self.apply(|inner| {
            let removed = inner.state.remove_scenario_cascade(id);
            (removed, removed.then(|| StoreEvent::ScenarioRemoved(id.clone())))
        });
        if removed {
            tracing::warn!(scenario_id = %id, "scenario removed outside matrix build");
        }
        removed
    }

    /// Set one impact dimension, clamped into 0..=100; returns the stored value
    ///
    /// # Errors
    /// - `InvalidSelection` if the scenario does not exist
    pub fn update_impact_score(
        &self,
        scenario_id: &ScenarioId,
        dimension: ImpactDimension,
        value: i64,
    ) -> WorkflowResult<u8> {
        let assessment_default = self.config.assessment_default;
        let stored = self.try_apply(|inner| {
            inner.state.require_scenario(scenario_id)?;
            let stored = inner
                .state
                .assessments
                .entry(scenario_id.clone())
                .or_insert_with(|| ImpactAssessment::uniform(assessment_default))
                .set(dimension, value);
            Ok((
                stored,
                Some(StoreEvent::ImpactScoreChanged {
                    scenario_id: scenario_id.clone(),
                    dimension,
                    value: stored,
                }),
            ))
        })
        .map_err(|err| rejected(scenario_id, err))?;
        tracing::debug!(
            scenario_id = %scenario_id,
            dimension = ?dimension,
            value = stored,
            "impact score set"
        );
        Ok(stored)
    }

    /// Replace the risk profile (values clamped to 0..=5)
    pub fn set_risk_profile(&self, profile: RiskProfile) {
        let profile = RiskProfile::new(profile.appetite, profile.capacity);
        self.apply(|inner| {
            inner.state.risk_profile = profile;
            ((), Some(StoreEvent::RiskProfileChanged))
        });
        tracing::debug!(
            appetite = profile.appetite,
            capacity = profile.capacity,
            "risk profile updated"
        );
    }

    // ── Decide ─────────────────────────────────────────────────

    /// Assign a response strategy to a scenario
    ///
    /// # Errors
    /// - `InvalidSelection` if the scenario does not exist
    pub fn set_response_assignment(
        &self,
        scenario_id: &ScenarioId,
        response: ResponseStrategy,
    ) -> WorkflowResult<()> {
        self.try_apply(|inner| {
            inner.state.require_scenario(scenario_id)?;
            inner.state.responses.insert(scenario_id.clone(), response);
            Ok(((), Some(StoreEvent::ResponseChanged(scenario_id.clone()))))
        })
        .map_err(|err| rejected(scenario_id, err))?;
        tracing::debug!(scenario_id = %scenario_id, response = ?response, "response assigned");
        Ok(())
    }

    /// Remove a scenario's response strategy; false if none was set
    pub fn clear_response_assignment(&self, scenario_id: &ScenarioId) -> bool {
        let cleared = self.apply(|inner| {
            let cleared = inner.state.responses.shift_remove(scenario_id).is_some();
            (
                cleared,
                cleared.then(|| StoreEvent::ResponseChanged(scenario_id.clone())),
            )
        });
        tracing::debug!(scenario_id = %scenario_id, cleared, "response cleared");
        cleared
    }

    /// Replace the whole action list
    ///
    /// # Errors
    /// - `InvalidSelection` on duplicate action ids or unknown scenarios
    pub fn set_actions(&self, actions: Vec<ActionItem>) -> WorkflowResult<()> {
        let count = actions.len();
        self.try_apply(|inner| {
            let mut seen = HashSet::with_capacity(actions.len());
            for action in &actions {
                if !seen.insert(&action.id) {
                    return Err(WorkflowError::invalid_selection(format!(
                        "duplicate action id: {}",
                        action.id
                    )));
                }
                inner.state.require_scenario(&action.scenario_id)?;
            }
            inner.state.actions = actions;
            Ok(((), Some(StoreEvent::ActionsChanged)))
        })
        .map_err(|err| {
            tracing::warn!(error = %err, "rejected action list");
            err
        })?;
        tracing::debug!(count, "actions replaced");
        Ok(())
    }

    /// Append one action
    ///
    /// # Errors
    /// - `InvalidSelection` if the id is taken or the scenario is unknown
    pub fn add_action(&self, action: ActionItem) -> WorkflowResult<ActionId> {
        let scenario_id = action.scenario_id.clone();
        let id = self.try_apply(|inner| {
            inner.state.require_scenario(&action.scenario_id)?;
            if inner.state.actions.iter().any(|a| a.id == action.id) {
                return Err(WorkflowError::invalid_selection(format!(
                    "duplicate action id: {}",
                    action.id
                )));
            }
            let id = action.id.clone();
            inner.state.actions.push(action);
            Ok((id, Some(StoreEvent::ActionsChanged)))
        })
        .map_err(|err| rejected(&scenario_id, err))?;
        tracing::debug!(action_id = %id, scenario_id = %scenario_id, "action added");
        Ok(id)
    }

    /// Flip an action's `selected` flag; returns the new value, `None` if unknown
    pub fn toggle_action_selected(&self, id: &ActionId) -> Option<bool> {
        let selected = self.apply(
            |inner| match inner.state.actions.iter_mut().find(|a| &a.id == id) {
                Some(action) => {
                    action.selected = !action.selected;
                    (Some(action.selected), Some(StoreEvent::ActionsChanged))
                }
                None => (None, None),
            },
        );
        match selected {
            Some(selected) => tracing::debug!(action_id = %id, selected, "action toggled"),
            None => tracing::debug!(action_id = %id, "ignoring toggle of unknown action"),
        }
        selected
    }

    /// Delete one action; false if unknown
    pub fn delete_action(&self, id: &ActionId) -> bool {
        let deleted = self.apply(|inner| {
            let before = inner.state.actions.len();
            inner.state.actions.retain(|a| &a.id != id);
            let deleted = inner.state.actions.len() != before;
            (deleted, deleted.then_some(StoreEvent::ActionsChanged))
        });
        tracing::debug!(action_id = %id, deleted, "action deleted");
        deleted
    }

    // ── Research notes ─────────────────────────────────────────

    /// Add a research note
    ///
    /// # Errors
    /// - `InvalidSelection` if the id is taken or a link points nowhere
    pub fn add_research_note(&self, note: ResearchNote) -> WorkflowResult<NoteId> {
        let id = self.try_apply(|inner| {
            if inner.state.research_notes.iter().any(|n| n.id == note.id) {
                return Err(WorkflowError::invalid_selection(format!(
                    "duplicate research note id: {}",
                    note.id
                )));
            }
            inner.state.validate_note_links(&note)?;
            let id = note.id.clone();
            inner.state.research_notes.push(note);
            Ok((id, Some(StoreEvent::ResearchNotesChanged)))
        })
        .map_err(|err| {
            tracing::warn!(error = %err, "rejected research note");
            err
        })?;
        tracing::debug!(note_id = %id, "research note added");
        Ok(id)
    }

    /// Replace a note's content; false if unknown
    pub fn update_research_note(&self, id: &NoteId, content: impl Into<String>) -> bool {
        let content = content.into();
        let updated = self.apply(
            |inner| match inner.state.research_notes.iter_mut().find(|n| &n.id == id) {
                Some(note) => {
                    note.content = content;
                    (true, Some(StoreEvent::ResearchNotesChanged))
                }
                None => (false, None),
            },
        );
        tracing::debug!(note_id = %id, updated, "research note updated");
        updated
    }

    /// Delete a note; false if unknown
    pub fn delete_research_note(&self, id: &NoteId) -> bool {
        let deleted = self.apply(|inner| {
            let before = inner.state.research_notes.len();
            inner.state.research_notes.retain(|n| &n.id != id);
            let deleted = inner.state.research_notes.len() != before;
            (deleted, deleted.then_some(StoreEvent::ResearchNotesChanged))
        });
        tracing::debug!(note_id = %id, deleted, "research note deleted");
        deleted
    }

    // ── External generation ────────────────────────────────────

    /// Issue a ticket for a generation request started on the current step
    ///
    /// Any earlier ticket of the same kind becomes stale.
    ///
    /// # Errors
    /// - `InvalidSelection` if a scenario-scoped kind names an unknown scenario
    pub fn begin_generation(&self, kind: GenerationKind) -> WorkflowResult<GenerationTicket> {
        let mut inner = self.inner.write();
        if let GenerationKind::Narrative(id) | GenerationKind::Actions(id) = &kind {
            inner.state.require_scenario(id)?;
        }
        let step = inner.state.progress.current_step;
        let ticket = inner.tickets.issue(kind, step);
        tracing::debug!(kind = %ticket.kind(), sequence = ticket.sequence(), "generation requested");
        Ok(ticket)
    }

    /// Whether a result for `ticket` would still be applied
    #[must_use]
    pub fn is_current(&self, ticket: &GenerationTicket) -> bool {
        let inner = self.inner.read();
        inner
            .tickets
            .is_current(ticket, inner.state.progress.current_step)
    }

    /// Commit a generated force set if its ticket is still current
    ///
    /// The list is truncated to the configured maximum.
    ///
    /// # Errors
    /// - `InvalidSelection` if the ticket is not a forces ticket or ids collide
    pub fn apply_generated_forces(
        &self,
        ticket: &GenerationTicket,
        mut forces: Vec<Force>,
    ) -> WorkflowResult<ApplyOutcome> {
        expect_kind(ticket, |k| matches!(k, GenerationKind::Forces))?;
        forces.truncate(self.config.max_generated_forces);
        let count = forces.len();
        let outcome = self.try_apply(|inner| {
            if !inner.ticket_is_current(ticket) {
                return Ok((ApplyOutcome::Discarded, None));
            }
            let matrix_reset = inner.state.replace_forces(forces)?;
            inner.tickets.settle(ticket);
            Ok((
                ApplyOutcome::Applied,
                Some(StoreEvent::ForcesReplaced {
                    count,
                    matrix_reset,
                }),
            ))
        })?;
        log_outcome(ticket, outcome);
        Ok(outcome)
    }

    /// Commit generated narrative text if its ticket is still current
    ///
    /// # Errors
    /// - `InvalidSelection` if the ticket is not a narrative ticket
    pub fn apply_generated_narrative(
        &self,
        ticket: &GenerationTicket,
        narrative: impl Into<String>,
    ) -> WorkflowResult<ApplyOutcome> {
        let GenerationKind::Narrative(scenario_id) = ticket.kind() else {
            return Err(wrong_kind(ticket));
        };
        let narrative = narrative.into();
        let outcome = self.apply(|inner| {
            if !inner.ticket_is_current(ticket) {
                return (ApplyOutcome::Discarded, None);
            }
            let Some(scenario) = inner.state.scenario_mut(scenario_id) else {
                return (ApplyOutcome::Discarded, None);
            };
            scenario.narrative = narrative;
            inner.tickets.settle(ticket);
            (
                ApplyOutcome::Applied,
                Some(StoreEvent::ScenarioUpdated(scenario_id.clone())),
            )
        });
        log_outcome(ticket, outcome);
        Ok(outcome)
    }

    /// Append generated actions for a scenario if the ticket is still current
    ///
    /// Each action is re-pointed at the ticket's scenario.
    ///
    /// # Errors
    /// - `InvalidSelection` if the ticket is not an actions ticket or ids collide
    pub fn apply_generated_actions(
        &self,
        ticket: &GenerationTicket,
        actions: Vec<ActionItem>,
    ) -> WorkflowResult<ApplyOutcome> {
        let GenerationKind::Actions(scenario_id) = ticket.kind() else {
            return Err(wrong_kind(ticket));
        };
        let outcome = self.try_apply(|inner| {
            if !inner.ticket_is_current(ticket) || !inner.state.has_scenario(scenario_id) {
                return Ok((ApplyOutcome::Discarded, None));
            }
            let mut taken: HashSet<ActionId> =
                inner.state.actions.iter().map(|a| a.id.clone()).collect();
            if let Some(dup) = actions.iter().find(|a| !taken.insert(a.id.clone())) {
                return Err(WorkflowError::invalid_selection(format!(
                    "duplicate action id: {}",
                    dup.id
                )));
            }
            inner
                .state
                .actions
                .extend(actions.into_iter().map(|mut a| {
                    a.scenario_id = scenario_id.clone();
                    a
                }));
            inner.tickets.settle(ticket);
            Ok((ApplyOutcome::Applied, Some(StoreEvent::ActionsChanged)))
        })?;
        log_outcome(ticket, outcome);
        Ok(outcome)
    }

    // ── Snapshots ──────────────────────────────────────────────

    /// Capture the whole state
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.state())
    }

    /// Replace the whole state from a snapshot after validating it
    ///
    /// Outstanding generation requests become stale.
    ///
    /// # Errors
    /// - `SnapshotValidationFailure` if any invariant is violated; state is untouched
    pub fn restore(&self, snapshot: Snapshot) -> WorkflowResult<()> {
        if let Err(err) = snapshot.validate() {
            tracing::warn!(error = %err, "rejected snapshot");
            return Err(err.into());
        }
        self.apply(|inner| {
            inner.state = snapshot.state;
            inner.tickets.invalidate_all();
            ((), Some(StoreEvent::Restored))
        });
        tracing::info!("state restored from snapshot");
        Ok(())
    }

    // ── Selectors ──────────────────────────────────────────────

    /// Clone of the current state
    #[must_use]
    pub fn state(&self) -> SimulationState {
        self.inner.read().state.clone()
    }

    /// Read the state without cloning
    pub fn read<R>(&self, f: impl FnOnce(&SimulationState) -> R) -> R {
        f(&self.inner.read().state)
    }

    /// Number of committed changes since creation
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    /// Store configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Gate rules in effect
    #[inline]
    #[must_use]
    pub fn gates(&self) -> &GateRules {
        &self.gates
    }

    /// Current navigation position
    #[must_use]
    pub fn current_step(&self) -> SubStep {
        self.read(|s| s.progress.current_step)
    }

    /// Phase of the current step
    #[must_use]
    pub fn current_phase(&self) -> MainPhase {
        self.current_step().phase()
    }

    /// Whether continuing past `step` is permitted
    #[must_use]
    pub fn can_advance(&self, step: SubStep) -> bool {
        self.read(|s| self.gates.can_advance(step, s))
    }

    /// Gate status for every step
    #[must_use]
    pub fn gate_status(&self) -> Vec<(SubStep, Gate)> {
        self.read(|s| self.gates.status(s))
    }

    /// Position of the current step as a percentage of the pipeline
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        let index = self.current_step().global_index();
        u8::try_from(index * 100 / TOTAL_STEPS).unwrap_or(100)
    }

    /// Top `limit` rated forces by impact x uncertainty
    #[must_use]
    pub fn critical_uncertainties(&self, limit: usize) -> Vec<Force> {
        self.read(|s| s.critical_uncertainties(limit).into_iter().cloned().collect())
    }

    /// Strategic playbook for the current state
    #[must_use]
    pub fn playbook(&self) -> Playbook {
        self.read(|s| build_playbook(s, self.config.assessment_default))
    }
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WorkflowStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowStore")
            .field("config", &self.config)
            .field("revision", &self.revision())
            .field("subscribers", &self.subscribers.read().len())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn record(&mut self, event: StoreEvent) -> StoreChange {
        self.revision += 1;
        StoreChange {
            revision: self.revision,
            event,
        }
    }

    fn ticket_is_current(&self, ticket: &GenerationTicket) -> bool {
        self.tickets
            .is_current(ticket, self.state.progress.current_step)
    }
}

fn wrong_kind(ticket: &GenerationTicket) -> WorkflowError {
    WorkflowError::invalid_selection(format!(
        "ticket for {} used with the wrong apply operation",
        ticket.kind()
    ))
}

fn expect_kind(
    ticket: &GenerationTicket,
    accepts: impl FnOnce(&GenerationKind) -> bool,
) -> WorkflowResult<()> {
    if accepts(ticket.kind()) {
        Ok(())
    } else {
        Err(wrong_kind(ticket))
    }
}

fn rejected(scenario_id: &ScenarioId, err: WorkflowError) -> WorkflowError {
    tracing::warn!(scenario_id = %scenario_id, error = %err, "rejected scenario mutation");
    err
}

fn log_outcome(ticket: &GenerationTicket, outcome: ApplyOutcome) {
    match outcome {
        ApplyOutcome::Applied => {
            tracing::debug!(kind = %ticket.kind(), sequence = ticket.sequence(), "generation applied");
        }
        ApplyOutcome::Discarded => {
            tracing::warn!(kind = %ticket.kind(), sequence = ticket.sequence(), "discarded stale generation result");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn store_with_forces() -> (WorkflowStore, ForceId, ForceId) {
        let store = WorkflowStore::new();
        let x = Force::new("Regulation", "", PestCategory::Political);
        let y = Force::new("Adoption", "", PestCategory::Technological);
        let ids = (x.id.clone(), y.id.clone());
        store.set_forces(vec![x, y]).unwrap();
        (store, ids.0, ids.1)
    }

    #[test]
    fn subscribers_see_each_change_once() {
        let store = WorkflowStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |change| sink.lock().push(change.clone()));

        store.set_current_step(SubStep::Context);
        store.set_current_step(SubStep::Context);
        store.reset_simulation();
        assert!(store.unsubscribe(id));
        store.set_current_step(SubStep::Forces);

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].event, StoreEvent::StepChanged(SubStep::Context));
        assert_eq!(seen[0].revision, 1);
        assert_eq!(seen[1].event, StoreEvent::Reset);
    }

    #[test]
    fn subscriber_can_read_store_without_deadlock() {
        let store = Arc::new(WorkflowStore::new());
        let observed = Arc::new(Mutex::new(None));
        let (reader, sink) = (Arc::clone(&store), Arc::clone(&observed));
        store.subscribe(move |_| *sink.lock() = Some(reader.current_step()));
        store.set_current_step(SubStep::Risk);
        assert_eq!(*observed.lock(), Some(SubStep::Risk));
    }

    #[test]
    fn failed_mutation_emits_nothing() {
        let (store, x, _) = store_with_forces();
        let before = store.revision();
        assert!(store.select_axis_forces(&x, &x).is_err());
        assert!(store.select_axis_forces(&x, &ForceId::from("ghost")).is_err());
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn advance_respects_gates_and_completes_phases() {
        let store = WorkflowStore::new();
        assert_eq!(store.advance(), Some(SubStep::Context));
        assert_eq!(store.advance(), None);
        store.set_context(ExerciseContext::new("Energy", "Utility", "Grid transition"));
        store.set_focal_issue(FocalIssue::new("How do we stay relevant?", 10));
        assert_eq!(store.advance(), Some(SubStep::FocalIssue));
        assert_eq!(store.advance(), Some(SubStep::Forces));
        store.add_custom_force("Storage costs", "", PestCategory::Technological);
        assert_eq!(store.advance(), Some(SubStep::Uncertainties));
        assert!(store
            .state()
            .progress
            .completed_main_phases
            .contains(&MainPhase::Discover));
        assert_eq!(store.go_back(), Some(SubStep::Forces));
    }

    #[test]
    fn progress_percent_tracks_step() {
        let store = WorkflowStore::new();
        assert_eq!(store.progress_percent(), 7);
        store.set_current_step(SubStep::Report);
        assert_eq!(store.progress_percent(), 100);
    }

    #[test]
    fn wrong_ticket_kind_is_rejected() {
        let (store, _, _) = store_with_forces();
        let ticket = store.begin_generation(GenerationKind::Forces).unwrap();
        assert!(store.apply_generated_narrative(&ticket, "text").is_err());
        assert!(store.apply_generated_actions(&ticket, Vec::new()).is_err());
    }

    #[test]
    fn research_notes_validate_links() {
        let (store, x, _) = store_with_forces();
        let dangling = ResearchNote::new(MainPhase::Discover, "Why?", "Because")
            .linking_force(ForceId::from("ghost"));
        assert!(store.add_research_note(dangling).is_err());

        let note = ResearchNote::new(MainPhase::Discover, "Who regulates?", "Three agencies")
            .linking_force(x.clone());
        let id = store.add_research_note(note).unwrap();
        assert!(store.update_research_note(&id, "Two agencies"));
        assert_eq!(store.read(|s| s.research_notes[0].content.clone()), "Two agencies");

        assert!(store.remove_force(&x));
        assert!(store.read(|s| s.research_notes[0].linked_force_ids.is_empty()));
        assert!(store.delete_research_note(&id));
        assert!(!store.update_research_note(&id, "gone"));
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn captured_logs(f: impl FnOnce()) -> String {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = capture.0.lock().clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn mutations_are_traced_and_rejections_warn() {
        let (store, x, _) = store_with_forces();
        let logs = captured_logs(|| {
            store.set_context(ExerciseContext::new("Energy", "Utility", "Transition"));
            store.set_axis_labels(AxisKind::X, AxisLabels::new("Closed", "Open"));
            assert!(store
                .update_scenario(&ScenarioId::from("ghost"), ScenarioUpdate::narrative("x"))
                .is_err());
            assert!(store
                .select_axis_forces(&x, &ForceId::from("missing"))
                .is_err());
            store.set_current_step(SubStep::Forces);
            assert_eq!(store.go_back(), Some(SubStep::FocalIssue));
        });

        assert!(logs.contains("exercise context updated"));
        assert!(logs.contains("axis labels updated"));
        assert!(logs.contains("WARN"));
        assert!(logs.contains("rejected scenario mutation"));
        assert!(logs.contains("scenario_id=ghost"));
        assert!(logs.contains("rejected axis selection with unknown driver"));
        assert!(logs.contains("force_id=missing"));
        assert!(logs.contains("stepped back"));
    }

    #[test]
    fn scenario_scoped_ticket_requires_scenario() {
        let store = WorkflowStore::new();
        let err = store
            .begin_generation(GenerationKind::Narrative(ScenarioId::from("nope")))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidSelection(_)));
    }
}
