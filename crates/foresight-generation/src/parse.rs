//! Response parsing
//!
//! Turns raw generator text into entities. Models often wrap JSON in
//! markdown code fences, so those are stripped first. Anything that does not
//! match the expected shape is a `MalformedExternalResponse`.

use foresight_core::{
    ActionItem, BudgetRange, Force, Owner, PestCategory, ScenarioId, Timeline, WorkflowError,
    WorkflowResult,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static FENCE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\s*```\s*$").ok());

/// Remove a surrounding markdown code fence, if any
#[must_use]
pub fn strip_fences(text: &str) -> &str {
    FENCE
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map_or(text.trim(), |m| m.as_str().trim())
}

#[derive(Debug, Deserialize)]
struct ForceDraft {
    name: String,
    #[serde(default)]
    description: String,
    category: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Drafts<T> {
    List(Vec<T>),
    Wrapped {
        #[serde(alias = "forces", alias = "actions")]
        items: Vec<T>,
    },
}

impl<T> Drafts<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Drafts::List(items) | Drafts::Wrapped { items } => items,
        }
    }
}

fn drafts<T: for<'de> Deserialize<'de>>(text: &str, what: &str) -> WorkflowResult<Vec<T>> {
    let items = serde_json::from_str::<Drafts<T>>(strip_fences(text))
        .map_err(|e| WorkflowError::malformed(format!("{what} response is not a JSON list: {e}")))?
        .into_vec();
    if items.is_empty() {
        return Err(WorkflowError::malformed(format!("{what} response is empty")));
    }
    Ok(items)
}

/// Parse a generated force list
///
/// Forces get fresh ids, start unrated and are not marked custom. At most
/// `max` forces are kept.
///
/// # Errors
/// - `MalformedExternalResponse` on bad JSON, an empty list, a blank name or
///   an unknown category
pub fn parse_forces(text: &str, max: usize) -> WorkflowResult<Vec<Force>> {
    drafts::<ForceDraft>(text, "forces")?
        .into_iter()
        .take(max)
        .map(|draft| {
            let name = draft.name.trim();
            if name.is_empty() {
                return Err(WorkflowError::malformed("force with blank name"));
            }
            let category: PestCategory = draft
                .category
                .parse()
                .map_err(|e| WorkflowError::malformed(format!("force {name:?}: {e}")))?;
            Ok(Force::new(name, draft.description.trim(), category))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NarrativeReply {
    Object { narrative: String },
    Text(String),
}

/// Parse generated narrative text
///
/// Accepts plain prose, a JSON string, or `{"narrative": "..."}`.
///
/// # Errors
/// - `MalformedExternalResponse` if no text remains
pub fn parse_narrative(text: &str) -> WorkflowResult<String> {
    let body = strip_fences(text);
    let narrative = match serde_json::from_str::<NarrativeReply>(body) {
        Ok(NarrativeReply::Object { narrative } | NarrativeReply::Text(narrative)) => narrative,
        Err(_) => body.to_string(),
    };
    let narrative = narrative.trim();
    if narrative.is_empty() {
        return Err(WorkflowError::malformed("narrative response is empty"));
    }
    Ok(narrative.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionDraft {
    description: String,
    #[serde(default)]
    timeline: Timeline,
    #[serde(default)]
    budget_range: BudgetRange,
    #[serde(default)]
    owner: Owner,
}

/// Parse generated actions for one scenario
///
/// Actions get fresh ids and start unselected.
///
/// # Errors
/// - `MalformedExternalResponse` on bad JSON, an empty list, a blank
///   description or an unknown timeline, budget or owner
pub fn parse_actions(text: &str, scenario_id: &ScenarioId) -> WorkflowResult<Vec<ActionItem>> {
    drafts::<ActionDraft>(text, "actions")?
        .into_iter()
        .map(|draft| {
            let description = draft.description.trim();
            if description.is_empty() {
                return Err(WorkflowError::malformed("action with blank description"));
            }
            Ok(ActionItem::new(scenario_id.clone(), description)
                .with_timeline(draft.timeline)
                .with_budget(draft.budget_range)
                .with_owner(draft.owner))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_json_fence() {
        let text = "```json\n[1, 2]\n```";
        assert_eq!(strip_fences(text), "[1, 2]");
        assert_eq!(strip_fences("  [1]  "), "[1]");
    }

    #[test]
    fn parses_codes_and_labels() {
        let text = r#"[
            {"name": "Carbon tax", "description": "Levy on emissions", "category": "P"},
            {"name": "Heat waves", "category": "environmental"}
        ]"#;
        let forces = parse_forces(text, 10).unwrap();
        assert_eq!(forces.len(), 2);
        assert_eq!(forces[0].category, PestCategory::Political);
        assert_eq!(forces[1].category, PestCategory::Environmental);
        assert!(forces.iter().all(|f| !f.is_rated() && !f.is_custom));
        assert_ne!(forces[0].id, forces[1].id);
    }

    #[test]
    fn accepts_wrapped_list() {
        let text = r#"{"forces": [{"name": "Automation", "category": "T"}]}"#;
        assert_eq!(parse_forces(text, 10).unwrap()[0].name, "Automation");
    }

    #[test]
    fn truncates_to_max() {
        let text = r#"[{"name":"a","category":"S"},{"name":"b","category":"S"},{"name":"c","category":"S"}]"#;
        assert_eq!(parse_forces(text, 2).unwrap().len(), 2);
    }

    #[test]
    fn rejects_bad_force_payloads() {
        for text in [
            "not json",
            "[]",
            r#"[{"name": "  ", "category": "P"}]"#,
            r#"[{"name": "X", "category": "Q"}]"#,
        ] {
            let err = parse_forces(text, 10).unwrap_err();
            assert!(err.is_retryable(), "{text}");
        }
    }

    #[test]
    fn narrative_shapes() {
        assert_eq!(parse_narrative("  A calm decade.  ").unwrap(), "A calm decade.");
        assert_eq!(parse_narrative(r#""Quoted""#).unwrap(), "Quoted");
        assert_eq!(
            parse_narrative("```json\n{\"narrative\": \"Boom\"}\n```").unwrap(),
            "Boom"
        );
        assert!(parse_narrative("```\n\n```").is_err());
    }

    #[test]
    fn actions_fill_defaults() {
        let id = ScenarioId::from("tl");
        let text = r#"[
            {"description": "Hedge fuel costs", "timeline": "immediate", "owner": "finance"},
            {"description": "Scout partners"}
        ]"#;
        let actions = parse_actions(text, &id).unwrap();
        assert_eq!(actions[0].timeline, Timeline::Immediate);
        assert_eq!(actions[0].owner, Owner::Finance);
        assert_eq!(actions[1].timeline, Timeline::default());
        assert!(actions.iter().all(|a| a.scenario_id == id && !a.selected));
    }

    #[test]
    fn rejects_unknown_timeline() {
        let text = r#"[{"description": "x", "timeline": "someday"}]"#;
        assert!(parse_actions(text, &ScenarioId::from("tl")).is_err());
    }
}
