//! Matrix derivation
//!
//! Turns the two critical uncertainties into the four quadrant scenarios.
//! Pure: the same pair of axes always yields the same four scenario ids, and
//! only the names change when labels change.

use crate::error::{WorkflowError, WorkflowResult};
use crate::types::{Axis, AxisKind, AxisLabels, Extreme, ForceId, Quadrant, Scenario, ScenarioId};

/// Separator placed between the x and y extreme labels in scenario names
pub const NAME_SEPARATOR: &str = " & ";

/// Stable scenario id for a quadrant of the matrix spanned by two drivers
#[must_use]
pub fn scenario_id_for(x_force: &ForceId, y_force: &ForceId, quadrant: Quadrant) -> ScenarioId {
    ScenarioId::from(format!("{x_force}:{y_force}:{}", quadrant.code()))
}

/// Generated scenario name, e.g. `Permissive & Rapid`
#[must_use]
pub fn scenario_name(x_labels: &AxisLabels, y_labels: &AxisLabels, quadrant: Quadrant) -> String {
    format!(
        "{}{NAME_SEPARATOR}{}",
        extreme_text(x_labels, AxisKind::X, quadrant.x_extreme()),
        extreme_text(y_labels, AxisKind::Y, quadrant.y_extreme()),
    )
}

fn extreme_text(labels: &AxisLabels, kind: AxisKind, extreme: Extreme) -> String {
    let label = labels.extreme(extreme).trim();
    if label.is_empty() {
        format!("{extreme} {kind}")
    } else {
        label.to_string()
    }
}

/// Derive the four quadrant scenarios, in TL, TR, BL, BR order
///
/// # Errors
/// - `InvalidSelection` if the axes are not one x and one y axis, or share a driver
pub fn derive_scenarios(x: &Axis, y: &Axis) -> WorkflowResult<[Scenario; 4]> {
    if x.kind != AxisKind::X || y.kind != AxisKind::Y {
        return Err(WorkflowError::invalid_selection(format!(
            "expected an x and a y axis, got {} and {}",
            x.kind, y.kind
        )));
    }
    if x.force_id == y.force_id {
        return Err(WorkflowError::invalid_selection(format!(
            "both axes driven by force {}",
            x.force_id
        )));
    }

    Ok(Quadrant::ALL.map(|quadrant| Scenario {
        id: scenario_id_for(&x.force_id, &y.force_id, quadrant),
        name: scenario_name(&x.labels, &y.labels, quadrant),
        quadrant,
        narrative: String::new(),
        signposts: Vec::new(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(kind: AxisKind, force: &str, low: &str, high: &str) -> Axis {
        Axis {
            kind,
            force_id: ForceId::from(force),
            labels: AxisLabels::new(low, high),
        }
    }

    #[test]
    fn names_follow_quadrant_extremes() {
        let x = axis(AxisKind::X, "reg", "Restrictive", "Permissive");
        let y = axis(AxisKind::Y, "tech", "Slow", "Rapid");
        let scenarios = derive_scenarios(&x, &y).unwrap();

        let named: Vec<(Quadrant, &str)> = scenarios
            .iter()
            .map(|s| (s.quadrant, s.name.as_str()))
            .collect();
        assert_eq!(
            named,
            [
                (Quadrant::TopLeft, "Restrictive & Rapid"),
                (Quadrant::TopRight, "Permissive & Rapid"),
                (Quadrant::BottomLeft, "Restrictive & Slow"),
                (Quadrant::BottomRight, "Permissive & Slow"),
            ]
        );
    }

    #[test]
    fn rejects_shared_driver() {
        let x = axis(AxisKind::X, "same", "a", "b");
        let y = axis(AxisKind::Y, "same", "c", "d");
        assert!(matches!(
            derive_scenarios(&x, &y),
            Err(WorkflowError::InvalidSelection(_))
        ));
    }

    #[test]
    fn rejects_swapped_kinds() {
        let x = axis(AxisKind::Y, "a", "a", "b");
        let y = axis(AxisKind::X, "b", "c", "d");
        assert!(derive_scenarios(&x, &y).is_err());
    }

    #[test]
    fn ids_ignore_labels() {
        let x1 = axis(AxisKind::X, "a", "one", "two");
        let x2 = axis(AxisKind::X, "a", "uno", "dos");
        let y = axis(AxisKind::Y, "b", "lo", "hi");
        let first = derive_scenarios(&x1, &y).unwrap();
        let second = derive_scenarios(&x2, &y).unwrap();
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_ne!(a.name, b.name);
        }
    }

    #[test]
    fn blank_labels_fall_back_to_extreme_names() {
        let x = axis(AxisKind::X, "a", "", "  ");
        let y = axis(AxisKind::Y, "b", "Slow", "");
        let scenarios = derive_scenarios(&x, &y).unwrap();
        assert_eq!(scenarios[0].name, "Low X & High Y");
        assert_eq!(scenarios[3].name, "High X & Slow");
    }
}
