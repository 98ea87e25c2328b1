//! Generation session
//!
//! Binds a [`TextGenerator`] to a shared [`WorkflowStore`]. Each operation
//! takes a ticket, builds its request from the current state, awaits the
//! generator, and hands the parsed result back to the store. Results whose
//! ticket went stale while the generator was working are discarded.

use crate::error::GenerationResult;
use crate::generator::TextGenerator;
use crate::parse::{parse_actions, parse_forces, parse_narrative};
use crate::request::{ActionRequest, ForceRequest, GenerationRequest, NarrativeRequest};
use foresight_core::{ApplyOutcome, GenerationKind, GenerationTicket, ScenarioId, WorkflowStore};
use std::sync::Arc;

/// Generation front-end for one store
#[derive(Clone)]
pub struct GenerationSession {
    store: Arc<WorkflowStore>,
    generator: Arc<dyn TextGenerator>,
}

impl GenerationSession {
    /// Create a session over a shared store
    pub fn new(store: Arc<WorkflowStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { store, generator }
    }

    /// The store results are applied to
    #[must_use]
    pub fn store(&self) -> &Arc<WorkflowStore> {
        &self.store
    }

    /// Replace the force set with a generated one
    ///
    /// # Errors
    /// - `Transport` if the generator fails
    /// - `Workflow(MalformedExternalResponse)` if the reply cannot be parsed
    pub async fn regenerate_forces(&self) -> GenerationResult<ApplyOutcome> {
        let max = self.store.config().max_generated_forces;
        let ticket = self.store.begin_generation(GenerationKind::Forces)?;
        let request = self
            .store
            .read(|state| GenerationRequest::Forces(ForceRequest::from_state(state, max)));

        let Some(text) = self.fetch(&ticket, &request).await? else {
            return Ok(ApplyOutcome::Discarded);
        };
        let forces = parse_forces(&text, max).map_err(|err| {
            tracing::warn!(error = %err, "unusable force response");
            err
        })?;
        Ok(self.store.apply_generated_forces(&ticket, forces)?)
    }

    /// Fill a scenario's narrative with generated text
    ///
    /// # Errors
    /// - `Workflow(InvalidSelection)` if the scenario or an axis is missing
    /// - `Transport` if the generator fails
    /// - `Workflow(MalformedExternalResponse)` if the reply is empty
    pub async fn suggest_narrative(&self, scenario_id: &ScenarioId) -> GenerationResult<ApplyOutcome> {
        let request = self
            .store
            .read(|state| NarrativeRequest::from_state(state, scenario_id))?;
        let ticket = self
            .store
            .begin_generation(GenerationKind::Narrative(scenario_id.clone()))?;

        let Some(text) = self
            .fetch(&ticket, &GenerationRequest::Narrative(request))
            .await?
        else {
            return Ok(ApplyOutcome::Discarded);
        };
        let narrative = parse_narrative(&text).map_err(|err| {
            tracing::warn!(scenario_id = %scenario_id, error = %err, "unusable narrative response");
            err
        })?;
        Ok(self.store.apply_generated_narrative(&ticket, narrative)?)
    }

    /// Append generated actions to a scenario
    ///
    /// # Errors
    /// - `Workflow(InvalidSelection)` if the scenario is missing
    /// - `Transport` if the generator fails
    /// - `Workflow(MalformedExternalResponse)` if the reply cannot be parsed
    pub async fn suggest_actions(&self, scenario_id: &ScenarioId) -> GenerationResult<ApplyOutcome> {
        let assessment_default = self.store.config().assessment_default;
        let request = self
            .store
            .read(|state| ActionRequest::from_state(state, scenario_id, assessment_default))?;
        let ticket = self
            .store
            .begin_generation(GenerationKind::Actions(scenario_id.clone()))?;

        let Some(text) = self
            .fetch(&ticket, &GenerationRequest::Actions(request))
            .await?
        else {
            return Ok(ApplyOutcome::Discarded);
        };
        let actions = parse_actions(&text, scenario_id).map_err(|err| {
            tracing::warn!(scenario_id = %scenario_id, error = %err, "unusable actions response");
            err
        })?;
        Ok(self.store.apply_generated_actions(&ticket, actions)?)
    }

    /// Call the generator; `None` if the ticket went stale meanwhile
    async fn fetch(
        &self,
        ticket: &GenerationTicket,
        request: &GenerationRequest,
    ) -> GenerationResult<Option<String>> {
        tracing::debug!(kind = %request.kind(), sequence = ticket.sequence(), "calling generator");
        let text = self.generator.generate(request).await?;
        if self.store.is_current(ticket) {
            Ok(Some(text))
        } else {
            tracing::warn!(kind = %ticket.kind(), sequence = ticket.sequence(), "discarded stale generation result");
            Ok(None)
        }
    }
}

impl std::fmt::Debug for GenerationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationSession")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::generator::MockTextGenerator;
    use foresight_core::{SubStep, WorkflowError};

    const FORCES: &str = r#"[
        {"name": "Carbon tax", "category": "P"},
        {"name": "Battery prices", "category": "E"}
    ]"#;

    fn session_with(mock: MockTextGenerator) -> GenerationSession {
        GenerationSession::new(Arc::new(WorkflowStore::new()), Arc::new(mock))
    }

    #[tokio::test]
    async fn applies_generated_forces() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(|_| Ok(FORCES.to_string()));
        let session = session_with(mock);

        let outcome = session.regenerate_forces().await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);
        let names: Vec<String> = session
            .store()
            .read(|s| s.forces.iter().map(|f| f.name.clone()).collect());
        assert_eq!(names, vec!["Carbon tax", "Battery prices"]);
    }

    #[tokio::test]
    async fn malformed_reply_leaves_state_unchanged() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .returning(|_| Ok("I'm sorry, I can't help with that.".to_string()));
        let session = session_with(mock);
        session.store().add_custom_force("Keep me", "", foresight_core::PestCategory::Social);
        let before = session.store().state();

        let err = session.regenerate_forces().await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Workflow(WorkflowError::MalformedExternalResponse(_))
        ));
        assert_eq!(session.store().state(), before);
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .returning(|_| Err(GenerationError::transport("connection refused")));
        let session = session_with(mock);
        let err = session.regenerate_forces().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(session.store().read(|s| s.forces.is_empty()));
    }

    #[tokio::test]
    async fn unknown_scenario_never_reaches_generator() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate().times(0);
        let session = session_with(mock);
        let err = session
            .suggest_narrative(&ScenarioId::from("missing"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Workflow(WorkflowError::InvalidSelection(_))
        ));
    }

    #[tokio::test]
    async fn request_carries_context() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|request| match request {
                GenerationRequest::Forces(r) => r.industry == "Retail" && r.max_forces == 24,
                _ => false,
            })
            .returning(|_| Ok(FORCES.to_string()));
        let session = session_with(mock);
        session.store().set_context(foresight_core::ExerciseContext::new(
            "Retail",
            "Chain",
            "Footfall decline",
        ));
        session.store().set_current_step(SubStep::Forces);
        assert_eq!(
            session.regenerate_forces().await.unwrap(),
            ApplyOutcome::Applied
        );
    }
}
