//! Entity model for the scenario-planning exercise
//!
//! Defines the records the workflow store manages:
//! - Driving forces and their PEST categories
//! - Axis labels and matrix quadrants
//! - Scenarios and their impact assessments
//! - Risk profile, response assignments, action items
//! - Research notes and discover-phase context

use crate::error::ParseCategoryError;
use crate::registry::MainPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Highest force rating; 0 means "not rated"
pub const RATING_MAX: u8 = 5;

/// Highest impact-assessment score
pub const SCORE_MAX: u8 = 100;

/// Starting value of every impact dimension
pub const ASSESSMENT_DEFAULT: u8 = 50;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, unique id
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new().to_string())
            }

            /// Raw id text
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Driving force identifier
    ForceId
);
string_id!(
    /// Scenario identifier
    ScenarioId
);
string_id!(
    /// Action item identifier
    ActionId
);
string_id!(
    /// Research note identifier
    NoteId
);

/// PEST classification (with environmental and legal extensions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PestCategory {
    #[serde(rename = "P")]
    Political,
    #[serde(rename = "E")]
    Economic,
    #[serde(rename = "S")]
    Social,
    #[serde(rename = "T")]
    Technological,
    #[serde(rename = "En")]
    Environmental,
    #[serde(rename = "L")]
    Legal,
}

impl PestCategory {
    /// All categories in display order
    pub const ALL: [PestCategory; 6] = [
        PestCategory::Political,
        PestCategory::Economic,
        PestCategory::Social,
        PestCategory::Technological,
        PestCategory::Environmental,
        PestCategory::Legal,
    ];

    /// Short code (`P`, `E`, `S`, `T`, `En`, `L`)
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            PestCategory::Political => "P",
            PestCategory::Economic => "E",
            PestCategory::Social => "S",
            PestCategory::Technological => "T",
            PestCategory::Environmental => "En",
            PestCategory::Legal => "L",
        }
    }

    /// Full name
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PestCategory::Political => "Political",
            PestCategory::Economic => "Economic",
            PestCategory::Social => "Social",
            PestCategory::Technological => "Technological",
            PestCategory::Environmental => "Environmental",
            PestCategory::Legal => "Legal",
        }
    }
}

impl FromStr for PestCategory {
    type Err = ParseCategoryError;

    /// Accepts either the short code or the full name, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(wanted) || c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseCategoryError(wanted.to_string()))
    }
}

impl fmt::Display for PestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A driving force from the PEST scan
///
/// `impact` and `uncertainty` start at 0 ("not rated"); the rating scale
/// proper is 1..=5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Force {
    pub id: ForceId,
    pub name: String,
    pub description: String,
    pub category: PestCategory,
    pub impact: u8,
    pub uncertainty: u8,
    pub is_custom: bool,
}

impl Force {
    /// Create an unrated force with a fresh id
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: PestCategory,
    ) -> Self {
        Self {
            id: ForceId::new(),
            name: name.into(),
            description: description.into(),
            category,
            impact: 0,
            uncertainty: 0,
            is_custom: false,
        }
    }

    /// Mark as user-authored
    #[inline]
    #[must_use]
    pub fn custom(mut self) -> Self {
        self.is_custom = true;
        self
    }

    /// With both ratings (clamped to the rating scale)
    #[inline]
    #[must_use]
    pub fn rated(mut self, impact: u8, uncertainty: u8) -> Self {
        self.impact = impact.min(RATING_MAX);
        self.uncertainty = uncertainty.min(RATING_MAX);
        self
    }

    /// Both ratings have been set
    #[inline]
    #[must_use]
    pub fn is_rated(&self) -> bool {
        self.impact > 0 && self.uncertainty > 0
    }

    /// Ranking weight for critical-uncertainty selection
    #[inline]
    #[must_use]
    pub fn criticality(&self) -> u16 {
        u16::from(self.impact) * u16::from(self.uncertainty)
    }
}

/// Which matrix axis a force drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    X,
    Y,
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AxisKind::X => "X",
            AxisKind::Y => "Y",
        })
    }
}

/// One end of an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extreme {
    Low,
    High,
}

impl fmt::Display for Extreme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Extreme::Low => "Low",
            Extreme::High => "High",
        })
    }
}

/// Qualitative descriptions of an axis' extremes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabels {
    pub low: String,
    pub high: String,
}

impl AxisLabels {
    /// Create labels
    #[must_use]
    pub fn new(low: impl Into<String>, high: impl Into<String>) -> Self {
        Self {
            low: low.into(),
            high: high.into(),
        }
    }

    /// Label for one extreme
    #[must_use]
    pub fn extreme(&self, extreme: Extreme) -> &str {
        match extreme {
            Extreme::Low => &self.low,
            Extreme::High => &self.high,
        }
    }

    /// Both ends carry non-blank text
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.low.trim().is_empty() && !self.high.trim().is_empty()
    }
}

/// A force designated as a matrix axis driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub kind: AxisKind,
    pub force_id: ForceId,
    pub labels: AxisLabels,
}

/// Cell of the 2x2 matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    /// x low, y high
    #[serde(rename = "TL")]
    TopLeft,
    /// x high, y high
    #[serde(rename = "TR")]
    TopRight,
    /// x low, y low
    #[serde(rename = "BL")]
    BottomLeft,
    /// x high, y low
    #[serde(rename = "BR")]
    BottomRight,
}

impl Quadrant {
    /// Presentation order: TL, TR, BL, BR
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Quadrant for a pair of axis extremes
    #[must_use]
    pub fn from_extremes(x: Extreme, y: Extreme) -> Self {
        match (x, y) {
            (Extreme::Low, Extreme::High) => Quadrant::TopLeft,
            (Extreme::High, Extreme::High) => Quadrant::TopRight,
            (Extreme::Low, Extreme::Low) => Quadrant::BottomLeft,
            (Extreme::High, Extreme::Low) => Quadrant::BottomRight,
        }
    }

    /// X-axis extreme of this cell
    #[must_use]
    pub fn x_extreme(self) -> Extreme {
        match self {
            Quadrant::TopLeft | Quadrant::BottomLeft => Extreme::Low,
            Quadrant::TopRight | Quadrant::BottomRight => Extreme::High,
        }
    }

    /// Y-axis extreme of this cell
    #[must_use]
    pub fn y_extreme(self) -> Extreme {
        match self {
            Quadrant::TopLeft | Quadrant::TopRight => Extreme::High,
            Quadrant::BottomLeft | Quadrant::BottomRight => Extreme::Low,
        }
    }

    /// Two-letter code
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Quadrant::TopLeft => "TL",
            Quadrant::TopRight => "TR",
            Quadrant::BottomLeft => "BL",
            Quadrant::BottomRight => "BR",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One plausible future, occupying a single quadrant
///
/// The quadrant never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    pub quadrant: Quadrant,
    pub narrative: String,
    #[serde(default)]
    pub signposts: Vec<String>,
}

/// Partial update for a scenario's editable fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioUpdate {
    pub name: Option<String>,
    pub narrative: Option<String>,
    pub signposts: Option<Vec<String>>,
}

impl ScenarioUpdate {
    /// Update only the narrative
    #[must_use]
    pub fn narrative(text: impl Into<String>) -> Self {
        Self {
            narrative: Some(text.into()),
            ..Self::default()
        }
    }

    /// Update only the name
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Also replace the signposts
    #[must_use]
    pub fn with_signposts(mut self, signposts: Vec<String>) -> Self {
        self.signposts = Some(signposts);
        self
    }

    pub(crate) fn apply_to(self, scenario: &mut Scenario) {
        if let Some(name) = self.name {
            scenario.name = name;
        }
        if let Some(narrative) = self.narrative {
            scenario.narrative = narrative;
        }
        if let Some(signposts) = self.signposts {
            scenario.signposts = signposts;
        }
    }
}

/// Impact assessment dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImpactDimension {
    Probability,
    Repercussion,
    Urgency,
    StrategicDisruption,
}

impl ImpactDimension {
    /// All dimensions
    pub const ALL: [ImpactDimension; 4] = [
        ImpactDimension::Probability,
        ImpactDimension::Repercussion,
        ImpactDimension::Urgency,
        ImpactDimension::StrategicDisruption,
    ];
}

/// Per-scenario impact scores, each 0..=100
///
/// Unlike force ratings, these start at a rated midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAssessment {
    pub probability: u8,
    pub repercussion: u8,
    pub urgency: u8,
    pub strategic_disruption: u8,
}

impl ImpactAssessment {
    /// All four dimensions at `value` (clamped)
    #[must_use]
    pub fn uniform(value: u8) -> Self {
        let value = value.min(SCORE_MAX);
        Self {
            probability: value,
            repercussion: value,
            urgency: value,
            strategic_disruption: value,
        }
    }

    /// Score for one dimension
    #[must_use]
    pub fn get(&self, dimension: ImpactDimension) -> u8 {
        match dimension {
            ImpactDimension::Probability => self.probability,
            ImpactDimension::Repercussion => self.repercussion,
            ImpactDimension::Urgency => self.urgency,
            ImpactDimension::StrategicDisruption => self.strategic_disruption,
        }
    }

    /// Set one dimension, clamping into 0..=100; returns the stored value
    pub fn set(&mut self, dimension: ImpactDimension, value: i64) -> u8 {
        let clamped = u8::try_from(value.clamp(0, i64::from(SCORE_MAX))).unwrap_or(SCORE_MAX);
        let slot = match dimension {
            ImpactDimension::Probability => &mut self.probability,
            ImpactDimension::Repercussion => &mut self.repercussion,
            ImpactDimension::Urgency => &mut self.urgency,
            ImpactDimension::StrategicDisruption => &mut self.strategic_disruption,
        };
        *slot = clamped;
        clamped
    }

    /// Rounded mean of the four dimensions
    #[must_use]
    pub fn composite(&self) -> u8 {
        let total: u16 = ImpactDimension::ALL
            .iter()
            .map(|d| u16::from(self.get(*d)))
            .sum();
        u8::try_from((total + 2) / 4).unwrap_or(SCORE_MAX)
    }
}

impl Default for ImpactAssessment {
    fn default() -> Self {
        Self::uniform(ASSESSMENT_DEFAULT)
    }
}

/// Organizational risk posture
///
/// Display range is 1..=5; 0 means "not yet set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub appetite: u8,
    pub capacity: u8,
}

impl RiskProfile {
    /// Create a profile (clamped to the rating scale)
    #[must_use]
    pub fn new(appetite: u8, capacity: u8) -> Self {
        Self {
            appetite: appetite.min(RATING_MAX),
            capacity: capacity.min(RATING_MAX),
        }
    }

    /// Completeness proxy used by gating
    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.appetite > 0
    }
}

/// Response strategy assigned to a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseStrategy {
    /// Act now; the scenario demands investment
    PriorityAction,
    /// Hedge against the downside
    Safeguard,
    /// Track signposts, no commitment yet
    Monitor,
    /// Deliberately defer
    Pause,
}

impl ResponseStrategy {
    /// All strategies
    pub const ALL: [ResponseStrategy; 4] = [
        ResponseStrategy::PriorityAction,
        ResponseStrategy::Safeguard,
        ResponseStrategy::Monitor,
        ResponseStrategy::Pause,
    ];

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ResponseStrategy::PriorityAction => "Priority action",
            ResponseStrategy::Safeguard => "Safeguard",
            ResponseStrategy::Monitor => "Monitor",
            ResponseStrategy::Pause => "Pause",
        }
    }
}

/// Action delivery horizon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timeline {
    /// Within three months
    Immediate,
    /// Three to twelve months
    #[default]
    ShortTerm,
    /// One to three years
    MediumTerm,
    /// Beyond three years
    LongTerm,
}

/// Indicative budget band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetRange {
    Minimal,
    #[default]
    Moderate,
    Significant,
    Major,
}

/// Accountable function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Owner {
    Executive,
    #[default]
    Strategy,
    Operations,
    Finance,
    Technology,
    People,
}

/// A planned action tied to one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: ActionId,
    pub scenario_id: ScenarioId,
    pub description: String,
    pub timeline: Timeline,
    pub budget_range: BudgetRange,
    pub owner: Owner,
    pub selected: bool,
}

impl ActionItem {
    /// New unselected action with default timeline, budget and owner
    #[must_use]
    pub fn new(scenario_id: ScenarioId, description: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(),
            scenario_id,
            description: description.into(),
            timeline: Timeline::default(),
            budget_range: BudgetRange::default(),
            owner: Owner::default(),
            selected: false,
        }
    }

    /// With timeline
    #[inline]
    #[must_use]
    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.timeline = timeline;
        self
    }

    /// With budget range
    #[inline]
    #[must_use]
    pub fn with_budget(mut self, budget_range: BudgetRange) -> Self {
        self.budget_range = budget_range;
        self
    }

    /// With owner
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    /// Marked for the final plan
    #[inline]
    #[must_use]
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }
}

/// Free-form annotation; never required for progression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchNote {
    pub id: NoteId,
    pub phase: MainPhase,
    pub prompt: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub linked_force_ids: Vec<ForceId>,
    #[serde(default)]
    pub linked_scenario_ids: Vec<ScenarioId>,
}

impl ResearchNote {
    /// New note stamped with the current time
    #[must_use]
    pub fn new(phase: MainPhase, prompt: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: NoteId::new(),
            phase,
            prompt: prompt.into(),
            content: content.into(),
            timestamp: Utc::now(),
            linked_force_ids: Vec::new(),
            linked_scenario_ids: Vec::new(),
        }
    }

    /// Link a force
    #[must_use]
    pub fn linking_force(mut self, id: ForceId) -> Self {
        self.linked_force_ids.push(id);
        self
    }

    /// Link a scenario
    #[must_use]
    pub fn linking_scenario(mut self, id: ScenarioId) -> Self {
        self.linked_scenario_ids.push(id);
        self
    }
}

/// Organizational context captured at the start of the exercise
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseContext {
    pub industry: String,
    pub organization_type: String,
    pub challenge_statement: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

impl ExerciseContext {
    /// Create context
    #[must_use]
    pub fn new(
        industry: impl Into<String>,
        organization_type: impl Into<String>,
        challenge_statement: impl Into<String>,
    ) -> Self {
        Self {
            industry: industry.into(),
            organization_type: organization_type.into(),
            challenge_statement: challenge_statement.into(),
            modifiers: Vec::new(),
        }
    }

    /// With an extra modifier label (e.g. "post-merger")
    #[must_use]
    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifiers.push(modifier.into());
        self
    }
}

/// The strategic question under exploration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocalIssue {
    pub strategic_question: String,
    pub time_horizon_years: u8,
}

impl FocalIssue {
    /// Create a focal issue
    #[must_use]
    pub fn new(strategic_question: impl Into<String>, time_horizon_years: u8) -> Self {
        Self {
            strategic_question: strategic_question.into(),
            time_horizon_years,
        }
    }
}
