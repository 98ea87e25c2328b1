//! Generation tickets
//!
//! Every request to the external text-generation service is issued a
//! ticket. A result may only be applied while its ticket is still current:
//! it is the latest request of its kind, no reset or restore happened since,
//! and the user has not moved off the step that issued it, even briefly.

use crate::registry::SubStep;
use crate::types::ScenarioId;
use std::collections::HashMap;
use std::fmt;

/// What a generation request produces
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenerationKind {
    /// A replacement force set
    Forces,
    /// Narrative text for one scenario
    Narrative(ScenarioId),
    /// Suggested actions for one scenario
    Actions(ScenarioId),
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationKind::Forces => f.write_str("forces"),
            GenerationKind::Narrative(id) => write!(f, "narrative({id})"),
            GenerationKind::Actions(id) => write!(f, "actions({id})"),
        }
    }
}

/// Receipt for an in-flight generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    kind: GenerationKind,
    sequence: u64,
    epoch: u64,
    navigation: u64,
    step: SubStep,
}

impl GenerationTicket {
    /// Kind of content requested
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &GenerationKind {
        &self.kind
    }

    /// Step that issued the request
    #[inline]
    #[must_use]
    pub fn step(&self) -> SubStep {
        self.step
    }

    /// Monotonic request number
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Whether a generation result was committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Result committed to the store
    Applied,
    /// Result was stale and ignored
    Discarded,
}

/// Tracks the latest ticket per kind
#[derive(Debug, Default)]
pub(crate) struct TicketLedger {
    epoch: u64,
    navigation: u64,
    next_sequence: u64,
    latest: HashMap<GenerationKind, u64>,
}

impl TicketLedger {
    pub(crate) fn issue(&mut self, kind: GenerationKind, step: SubStep) -> GenerationTicket {
        self.next_sequence += 1;
        self.latest.insert(kind.clone(), self.next_sequence);
        GenerationTicket {
            kind,
            sequence: self.next_sequence,
            epoch: self.epoch,
            navigation: self.navigation,
            step,
        }
    }

    pub(crate) fn is_current(&self, ticket: &GenerationTicket, step: SubStep) -> bool {
        ticket.epoch == self.epoch
            && ticket.navigation == self.navigation
            && ticket.step == step
            && self.latest.get(&ticket.kind) == Some(&ticket.sequence)
    }

    /// Retire a ticket once its result is committed
    pub(crate) fn settle(&mut self, ticket: &GenerationTicket) {
        if self.latest.get(&ticket.kind) == Some(&ticket.sequence) {
            self.latest.remove(&ticket.kind);
        }
    }

    /// Record a step change; tickets issued before it go stale
    pub(crate) fn navigated(&mut self) {
        self.navigation += 1;
    }

    /// Invalidate every outstanding ticket
    pub(crate) fn invalidate_all(&mut self) {
        self.epoch += 1;
        self.latest.clear();
    }
}
