//! Phase and step registry
//!
//! Static description of the exercise pipeline: four main phases, each with
//! an ordered list of sub-steps (thirteen in total). Pure lookup tables, no
//! runtime state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Total number of sub-steps across all phases
pub const TOTAL_STEPS: usize = 13;

/// Main phases of the exercise, in order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum MainPhase {
    /// Frame the question and scan driving forces
    Discover,
    /// Pick critical uncertainties and build the matrix
    Design,
    /// Flesh out and assess each scenario
    Develop,
    /// Choose responses and plan actions
    Decide,
}

impl MainPhase {
    /// All phases in pipeline order
    pub const ALL: [MainPhase; 4] = [
        MainPhase::Discover,
        MainPhase::Design,
        MainPhase::Develop,
        MainPhase::Decide,
    ];

    /// Ordered sub-steps of this phase
    #[must_use]
    pub fn steps(self) -> &'static [SubStep] {
        use SubStep::*;
        match self {
            MainPhase::Discover => &[PreRead, Context, FocalIssue, Forces],
            MainPhase::Design => &[Uncertainties, Axes, Matrix],
            MainPhase::Develop => &[Narratives, Impact, Risk],
            MainPhase::Decide => &[Responses, Actions, Report],
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MainPhase::Discover => "Discover",
            MainPhase::Design => "Design",
            MainPhase::Develop => "Develop",
            MainPhase::Decide => "Decide",
        }
    }
}

impl fmt::Display for MainPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sub-steps of the exercise, in global order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum SubStep {
    /// Introductory reading
    #[default]
    PreRead,
    /// Organization and industry context
    Context,
    /// Strategic question being explored
    FocalIssue,
    /// PEST scan of driving forces
    Forces,
    /// Rating forces and picking two critical uncertainties
    Uncertainties,
    /// Labeling the extremes of each axis
    Axes,
    /// 2x2 scenario matrix
    Matrix,
    /// Narrative for each scenario
    Narratives,
    /// Impact assessment per scenario
    Impact,
    /// Organizational risk appetite and capacity
    Risk,
    /// Response strategy per scenario
    Responses,
    /// Action plan per scenario
    Actions,
    /// Strategic playbook
    Report,
}

impl SubStep {
    /// All sub-steps in global order
    pub const ALL: [SubStep; TOTAL_STEPS] = [
        SubStep::PreRead,
        SubStep::Context,
        SubStep::FocalIssue,
        SubStep::Forces,
        SubStep::Uncertainties,
        SubStep::Axes,
        SubStep::Matrix,
        SubStep::Narratives,
        SubStep::Impact,
        SubStep::Risk,
        SubStep::Responses,
        SubStep::Actions,
        SubStep::Report,
    ];

    /// Phase this step belongs to
    #[must_use]
    pub fn phase(self) -> MainPhase {
        use SubStep::*;
        match self {
            PreRead | Context | FocalIssue | Forces => MainPhase::Discover,
            Uncertainties | Axes | Matrix => MainPhase::Design,
            Narratives | Impact | Risk => MainPhase::Develop,
            Responses | Actions | Report => MainPhase::Decide,
        }
    }

    /// 1-based position across the whole pipeline
    #[must_use]
    pub fn global_index(self) -> usize {
        self as usize + 1
    }

    /// Following step, `None` at the end of the pipeline
    #[must_use]
    pub fn next(self) -> Option<SubStep> {
        Self::ALL.get(self.global_index()).copied()
    }

    /// Preceding step, `None` at the start of the pipeline
    #[must_use]
    pub fn previous(self) -> Option<SubStep> {
        (self as usize).checked_sub(1).map(|i| Self::ALL[i])
    }

    /// True if this is the last step of its phase
    #[must_use]
    pub fn closes_phase(self) -> bool {
        self.phase().steps().last() == Some(&self)
    }

    /// URL-style slug, e.g. `focal-issue`
    #[must_use]
    pub fn slug(self) -> &'static str {
        use SubStep::*;
        match self {
            PreRead => "pre-read",
            Context => "context",
            FocalIssue => "focal-issue",
            Forces => "forces",
            Uncertainties => "uncertainties",
            Axes => "axes",
            Matrix => "matrix",
            Narratives => "narratives",
            Impact => "impact",
            Risk => "risk",
            Responses => "responses",
            Actions => "actions",
            Report => "report",
        }
    }
}

impl fmt::Display for SubStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.phase().label().to_lowercase(), self.slug())
    }
}

/// Ordered sub-steps of `phase`
#[inline]
#[must_use]
pub fn steps_of(phase: MainPhase) -> &'static [SubStep] {
    phase.steps()
}

/// Phase owning `step`
#[inline]
#[must_use]
pub fn phase_of(step: SubStep) -> MainPhase {
    step.phase()
}

/// Position of `step` in 1..=13
#[inline]
#[must_use]
pub fn global_index(step: SubStep) -> usize {
    step.global_index()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_cover_every_step_once_in_order() {
        let flattened: Vec<SubStep> = MainPhase::ALL
            .iter()
            .flat_map(|p| p.steps().iter().copied())
            .collect();
        assert_eq!(flattened, SubStep::ALL.to_vec());
    }

    #[test]
    fn phase_of_agrees_with_steps_of() {
        for phase in MainPhase::ALL {
            for step in steps_of(phase) {
                assert_eq!(phase_of(*step), phase);
            }
        }
    }

    #[test]
    fn global_index_is_one_based() {
        assert_eq!(global_index(SubStep::PreRead), 1);
        assert_eq!(global_index(SubStep::Matrix), 7);
        assert_eq!(global_index(SubStep::Report), TOTAL_STEPS);
    }

    #[test]
    fn navigation_stops_at_the_ends() {
        assert_eq!(SubStep::PreRead.previous(), None);
        assert_eq!(SubStep::Report.next(), None);
        assert_eq!(SubStep::Forces.next(), Some(SubStep::Uncertainties));
        assert_eq!(SubStep::Uncertainties.previous(), Some(SubStep::Forces));
    }

    #[test]
    fn closing_steps() {
        assert!(SubStep::Forces.closes_phase());
        assert!(SubStep::Matrix.closes_phase());
        assert!(!SubStep::Narratives.closes_phase());
    }

    #[test]
    fn serde_uses_slugs() {
        let json = serde_json::to_string(&SubStep::FocalIssue).unwrap();
        assert_eq!(json, "\"focal-issue\"");
        assert_eq!(SubStep::FocalIssue.to_string(), "discover/focal-issue");
    }
}
