//! Plain-text rendering for terminal output

use foresight_core::{Gate, MainPhase, Playbook, SubStep};
use std::fmt::Write;

/// Pipeline overview, optionally annotated with gate status
pub fn render_steps(gates: Option<&[(SubStep, Gate)]>, current: Option<SubStep>) -> String {
    let mut out = String::new();
    for phase in MainPhase::ALL {
        let _ = writeln!(out, "{}", phase.label());
        for step in phase.steps() {
            let marker = if current == Some(*step) { ">" } else { " " };
            let _ = write!(out, "{marker} {:>2}. {}", step.global_index(), step.slug());
            if let Some(gate) = gates.and_then(|g| g.iter().find(|(s, _)| s == step)) {
                match gate.1 {
                    Gate::Open => out.push_str("  [open]"),
                    Gate::Blocked(reason) => {
                        let _ = write!(out, "  [blocked: {reason}]");
                    }
                }
            }
            out.push('\n');
        }
    }
    out
}

/// Human-readable strategic playbook
pub fn render_playbook(playbook: &Playbook) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Strategic Playbook");
    let _ = writeln!(out, "==================");
    let _ = writeln!(
        out,
        "{} / {}",
        playbook.context.industry, playbook.context.organization_type
    );
    if !playbook.focal_issue.strategic_question.is_empty() {
        let _ = writeln!(
            out,
            "Question ({}y): {}",
            playbook.focal_issue.time_horizon_years, playbook.focal_issue.strategic_question
        );
    }
    let _ = writeln!(
        out,
        "Risk appetite {}/5, capacity {}/5",
        playbook.risk_profile.appetite, playbook.risk_profile.capacity
    );

    if !playbook.critical_uncertainties.is_empty() {
        let _ = writeln!(out, "\nCritical uncertainties:");
        for force in &playbook.critical_uncertainties {
            let _ = writeln!(
                out,
                "  - {} [{}] impact {} x uncertainty {}",
                force.name,
                force.category.code(),
                force.impact,
                force.uncertainty
            );
        }
    }

    for entry in &playbook.entries {
        let _ = writeln!(out, "\n[{}] {}", entry.quadrant, entry.name);
        let response = entry.response.map_or("unassigned", |r| r.label());
        let _ = writeln!(
            out,
            "  composite {} | response: {response}",
            entry.composite_score
        );
        if !entry.narrative.is_empty() {
            let _ = writeln!(out, "  {}", entry.narrative);
        }
        for action in &entry.actions {
            let mark = if action.selected { "x" } else { " " };
            let _ = writeln!(out, "  [{mark}] {}", action.description);
        }
    }
    if playbook.research_note_count > 0 {
        let _ = writeln!(out, "\n{} research notes", playbook.research_note_count);
    }
    out
}
