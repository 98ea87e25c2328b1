//! Foresight Core - scenario-planning workflow engine
//!
//! Drives a strategic-foresight exercise through four phases (Discover,
//! Design, Develop, Decide) and thirteen sub-steps:
//! - Collects driving forces and rates them on impact and uncertainty
//! - Derives a 2x2 scenario matrix from two critical uncertainties
//! - Tracks narratives, impact assessments, risk posture and responses
//! - Aggregates everything into a strategic playbook
//!
//! All state lives in a [`WorkflowStore`]; gating rules decide when the user
//! may continue to the next step.
//!
//! # Example
//!
//! ```rust,ignore
//! use foresight_core::prelude::*;
//!
//! let store = WorkflowStore::new();
//! let x = Force::new("Regulation", "", PestCategory::Political).rated(5, 5);
//! let y = Force::new("Adoption", "", PestCategory::Technological).rated(5, 5);
//! let (xid, yid) = (x.id.clone(), y.id.clone());
//! store.set_forces(vec![x, y])?;
//! store.select_axis_forces(&xid, &yid)?;
//! store.set_axis_labels(AxisKind::X, AxisLabels::new("Restrictive", "Permissive"));
//! store.set_axis_labels(AxisKind::Y, AxisLabels::new("Slow", "Rapid"));
//! store.build_matrix()?;
//!
//! assert_eq!(store.playbook().entries.len(), 4);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod gating;
pub mod matrix;
pub mod registry;
pub mod report;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod ticket;
pub mod types;

pub use config::WorkflowConfig;
pub use error::{ParseCategoryError, SnapshotError, WorkflowError, WorkflowResult};
pub use gating::{can_advance, Gate, GateRules};
pub use matrix::{derive_scenarios, scenario_id_for, scenario_name};
pub use registry::{global_index, phase_of, steps_of, MainPhase, SubStep, TOTAL_STEPS};
pub use report::{build_playbook, Playbook, PlaybookEntry};
pub use snapshot::{validate_state, Snapshot, SNAPSHOT_VERSION};
pub use state::{AxisSelection, ProgressState, SimulationState};
pub use store::{MatrixBuild, StoreChange, StoreEvent, SubscriptionId, WorkflowStore};
pub use ticket::{ApplyOutcome, GenerationKind, GenerationTicket};
pub use types::{
    ActionId, ActionItem, Axis, AxisKind, AxisLabels, BudgetRange, ExerciseContext, Extreme,
    FocalIssue, Force, ForceId, ImpactAssessment, ImpactDimension, NoteId, Owner, PestCategory,
    Quadrant, ResearchNote, ResponseStrategy, RiskProfile, Scenario, ScenarioId, ScenarioUpdate,
    Timeline, ASSESSMENT_DEFAULT, RATING_MAX, SCORE_MAX,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a workflow
    pub use crate::{
        ActionItem, AxisKind, AxisLabels, ExerciseContext, FocalIssue, Force, ForceId,
        ImpactDimension, PestCategory, Quadrant, ResponseStrategy, RiskProfile, ScenarioId,
        ScenarioUpdate, SubStep, WorkflowConfig, WorkflowError, WorkflowResult, WorkflowStore,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
