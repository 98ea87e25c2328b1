//! Foresight Generation - external text generation for workflows
//!
//! Drafting forces, narratives and actions is delegated to an external
//! [`TextGenerator`]. This crate:
//! - Builds structured requests from the current state
//! - Parses replies into entities, rejecting malformed output
//! - Applies results through the store's ticket checks so late replies
//!   never overwrite newer work

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod generator;
pub mod parse;
pub mod request;
pub mod session;

pub use error::{GenerationError, GenerationResult};
pub use generator::{ScriptedGenerator, TextGenerator};
pub use parse::{parse_actions, parse_forces, parse_narrative, strip_fences};
pub use request::{
    ActionRequest, AxisBrief, ForceRequest, GenerationRequest, NarrativeRequest, RequestKind,
};
pub use session::GenerationSession;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
