//! Render a skill specification into its generated document.
//!
//! The output is the machine-owned content the reconciler wraps in
//! generated markers, and the reference the consistency layer compares
//! rendered documents against. Front matter carries the skill name and a
//! description derived from the first few non-trivial rule conditions.

use itertools::Itertools;
use serde_yaml::Value;

use crate::spec::rules::{RuleAction, normalize};

/// Render the generated document body for a spec.
#[must_use]
pub fn skill_md(spec: &Value) -> String {
    let skill = spec.get("skill").cloned().unwrap_or(Value::Null);
    let rules = normalize(spec.get("decision_rules").unwrap_or(&Value::Null));

    let name = str_field(&skill, "name");
    let purpose = str_field(&skill, "purpose");

    let triggers: Vec<String> = rules
        .rules
        .iter()
        .filter_map(|r| r.when.as_ref())
        .filter(|when| !when.is_trivial())
        .take(3)
        .map(ToString::to_string)
        .collect();
    let trigger_text = if triggers.is_empty() {
        "general use".to_string()
    } else {
        triggers.join(" | ")
    };

    let mut lines: Vec<String> = Vec::new();

    lines.push("---".to_string());
    lines.push(format!("name: \"{name}\""));
    lines.push(format!("description: \"{purpose} Use when: {trigger_text}\""));
    lines.push("---".to_string());
    lines.push(String::new());

    lines.push(format!("# {}", title_case(&name)));
    lines.push(String::new());

    lines.push("## Purpose".to_string());
    lines.push(String::new());
    lines.push(purpose);
    lines.push(String::new());

    lines.push("## Inputs".to_string());
    lines.push(String::new());
    if let Some(inputs) = spec.get("inputs").and_then(Value::as_sequence) {
        for input in inputs {
            let required = if input.get("required").and_then(Value::as_bool) == Some(true) {
                "required"
            } else {
                "optional"
            };
            lines.push(format!(
                "- **{}** ({}, {required})",
                str_field(input, "name"),
                str_field(input, "type"),
            ));
            if let Some(description) = input.get("description").and_then(Value::as_str) {
                lines.push(format!("  {description}"));
            }
            if let Some(constraints) = input.get("constraints").and_then(Value::as_sequence) {
                let joined = constraints.iter().map(display_value).join(", ");
                lines.push(format!("  Constraints: {joined}"));
            }
        }
    }
    lines.push(String::new());

    if let Some(non_goals) = non_empty_list(spec, "non_goals") {
        lines.push("## What This Skill Does NOT Do".to_string());
        lines.push(String::new());
        for goal in non_goals {
            lines.push(format!("- {}", display_value(goal)));
        }
        lines.push(String::new());
    }

    if let Some(preconditions) = non_empty_list(spec, "preconditions") {
        lines.push("## Prerequisites".to_string());
        lines.push(String::new());
        for prereq in preconditions {
            lines.push(format!("- {}", display_value(prereq)));
        }
        lines.push(String::new());
    }

    if !rules.rules.is_empty() {
        lines.push("## Decision Criteria".to_string());
        lines.push(String::new());
        for rule in &rules.rules {
            lines.push(format!("### {}", rule.id.as_deref().unwrap_or("rule")));
            let when = rule
                .when
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            lines.push(format!("- **When**: `{when}`"));
            lines.push(format!("- **Then**: `{}`", action_text(rule.then.as_ref())));
            lines.push(String::new());
        }
    }

    if let Some(steps) = non_empty_list(spec, "steps") {
        lines.push("## Workflow".to_string());
        lines.push(String::new());
        for (i, step) in steps.iter().enumerate() {
            let action = str_field(step, "action");
            let output = step
                .get("output")
                .and_then(Value::as_str)
                .map(|o| format!(" -> `{o}`"))
                .unwrap_or_default();
            lines.push(format!("{}. **{action}**{output}", i + 1));
        }
        lines.push(String::new());
    }

    if let Some(edge_cases) = non_empty_list(spec, "edge_cases") {
        lines.push("## Edge Cases".to_string());
        lines.push(String::new());
        for case in edge_cases {
            lines.push(format!(
                "- **{}**: `{}`",
                str_field(case, "case"),
                case.get("expected").map(display_value).unwrap_or_default()
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Output Format".to_string());
    lines.push(String::new());
    let contract = spec.get("output_contract").cloned().unwrap_or(Value::Null);
    let format = contract
        .get("format")
        .and_then(Value::as_str)
        .unwrap_or("json");
    lines.push(format!("Format: `{format}`"));
    lines.push(String::new());
    lines.push("```json".to_string());
    lines.push(schema_json(contract.get("schema")));
    lines.push("```".to_string());
    lines.push(String::new());

    if let Some(failure_modes) = non_empty_list(spec, "failure_modes") {
        lines.push("## Error Handling".to_string());
        lines.push(String::new());
        for mode in failure_modes {
            let retryable = if mode.get("retryable").and_then(Value::as_bool) == Some(true) {
                "Retryable"
            } else {
                "Non-retryable"
            };
            lines.push(format!("- **{}**: {retryable}", str_field(mode, "code")));
            if let Some(description) = mode.get("description").and_then(Value::as_str) {
                lines.push(format!("  {description}"));
            }
        }
        lines.push(String::new());
    }

    let works_with = spec
        .get("context")
        .and_then(|c| c.get("works_with"))
        .and_then(Value::as_sequence);
    if let Some(refs) = works_with.filter(|r| !r.is_empty()) {
        lines.push("## Works Well With".to_string());
        lines.push(String::new());
        for reference in refs {
            lines.push(format!(
                "- **{}**: {}",
                str_field(reference, "skill"),
                str_field(reference, "reason")
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn non_empty_list<'a>(spec: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    spec.get(key)
        .and_then(Value::as_sequence)
        .filter(|items| !items.is_empty())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_value(other)
            .and_then(|v| serde_json::to_string(&v))
            .unwrap_or_default(),
    }
}

fn action_text(action: Option<&RuleAction>) -> String {
    action.map_or_else(
        || "{}".to_string(),
        |a| {
            serde_json::to_value(a)
                .and_then(|v| serde_json::to_string(&v))
                .unwrap_or_else(|_| "{}".to_string())
        },
    )
}

fn schema_json(schema: Option<&Value>) -> String {
    schema
        .and_then(|s| serde_json::to_value(s).ok())
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| "{}".to_string())
}

fn title_case(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .join(" ")
}
