use std::fmt::Write;

use fsm_core::{Definition, Source, Transition};

/// Graphviz rendering of a definition's state graph.
///
/// The initial state is drawn as a double circle, any-state transitions start from a `*` node,
/// and disabled transitions are dashed.
pub fn render(definition: &Definition) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph {} {{", quote(definition.name()));
    let _ = writeln!(out, "  rankdir=LR;");

    for state in definition.state_ids() {
        let shape = if state == definition.initial_state() {
            "doublecircle"
        } else {
            "circle"
        };
        let _ = writeln!(
            out,
            "  {} [shape={shape}];",
            quote(definition.state_name(state))
        );
    }

    let has_any = definition
        .transitions()
        .iter()
        .any(|t| t.from() == Source::Any);
    if has_any {
        let _ = writeln!(out, "  \"*\" [shape=plaintext];");
    }

    for (index, transition) in definition.transitions().iter().enumerate() {
        let from = match transition.from() {
            Source::Any => "\"*\"".to_string(),
            Source::State(state) => quote(definition.state_name(state)),
        };
        let to = quote(definition.state_name(definition.resolve(transition.to())));
        let mut attrs = vec![format!("label={}", quote(&label(definition, index, transition)))];
        if !transition.is_enabled() {
            attrs.push("style=dashed".to_string());
        }
        let _ = writeln!(out, "  {from} -> {to} [{}];", attrs.join(", "));
    }

    out.push_str("}\n");
    out
}

fn label(definition: &Definition, index: usize, transition: &Transition) -> String {
    let guards: Vec<String> = transition
        .guards()
        .iter()
        .map(|g| definition.describe(g))
        .collect();
    let head = match transition.name() {
        Some(name) => format!("#{index} {name}"),
        None => format!("#{index}"),
    };
    if guards.is_empty() {
        head
    } else {
        format!("{head}\\n{}", guards.join(" && "))
    }
}

/// Double-quoted DOT id. Backslashes pass through so labels can carry `\n` line breaks.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\\\""))
}
