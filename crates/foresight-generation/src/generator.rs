//! Text-generation seam
//!
//! The workflow never talks to a language model directly. It hands a
//! [`GenerationRequest`] to a [`TextGenerator`] and receives raw text back;
//! parsing and validation happen on this side of the seam.

use crate::error::{GenerationError, GenerationResult};
use crate::request::{GenerationRequest, RequestKind};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// External text-generation service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce raw text for a request
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<String>;
}

/// Generator that replays canned responses in order, per request kind
///
/// Useful for offline walkthroughs and tests. Records every request it sees.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<HashMap<RequestKind, VecDeque<String>>>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request of `kind`
    #[must_use]
    pub fn with_response(self, kind: RequestKind, text: impl Into<String>) -> Self {
        self.push(kind, text);
        self
    }

    /// Queue a response after construction
    pub fn push(&self, kind: RequestKind, text: impl Into<String>) {
        self.responses
            .lock()
            .entry(kind)
            .or_default()
            .push_back(text.into());
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.seen.lock().clone()
    }

    /// Responses still queued for `kind`
    #[must_use]
    pub fn remaining(&self, kind: RequestKind) -> usize {
        self.responses.lock().get(&kind).map_or(0, VecDeque::len)
    }
}

#[async_trait::async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<String> {
        self.seen.lock().push(request.clone());
        let kind = request.kind();
        self.responses
            .lock()
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| GenerationError::transport(format!("no scripted {kind} response")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ForceRequest;
    use foresight_core::SimulationState;

    fn force_request() -> GenerationRequest {
        GenerationRequest::Forces(ForceRequest::from_state(&SimulationState::new(), 10))
    }

    #[tokio::test]
    async fn replays_in_order_then_fails() {
        let generator = ScriptedGenerator::new()
            .with_response(RequestKind::Forces, "first")
            .with_response(RequestKind::Forces, "second");
        assert_eq!(generator.generate(&force_request()).await.unwrap(), "first");
        assert_eq!(generator.generate(&force_request()).await.unwrap(), "second");
        let err = generator.generate(&force_request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)));
        assert_eq!(generator.requests().len(), 3);
    }

    #[tokio::test]
    async fn kinds_have_separate_queues() {
        let generator = ScriptedGenerator::new().with_response(RequestKind::Narrative, "story");
        assert!(generator.generate(&force_request()).await.is_err());
        assert_eq!(generator.remaining(RequestKind::Narrative), 1);
    }
}
