//! Output Rendering
//!
//! Text and JSON renderings of check results, build plans and launch plans.
//! Text renderers return strings; the binary decides where they go.

use std::io::{self, Write};
use std::path::Path;

use serde_json::{json, Value};

use crate::application::{CheckResult, CheckStatus, LaunchPlan, PortSource};
use crate::domain::services::{StageGraph, StageId};
use crate::domain::value_objects::ProjectLayout;

use super::theme::{bold, dim, Icon};

/// Write a single NDJSON event (one JSON object per line).
pub fn write_event(out: &mut impl Write, event: &Value) -> io::Result<()> {
    let line = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}

pub fn render_check_report(result: &CheckResult, color: bool, unicode: bool) -> String {
    let mut out = String::new();
    let mut current_area: Option<&str> = None;

    for item in &result.items {
        if current_area != Some(item.area) {
            if current_area.is_some() {
                out.push('\n');
            }
            out.push_str(&bold(item.area, color));
            out.push('\n');
            current_area = Some(item.area);
        }

        let icon = match item.status {
            CheckStatus::Pass => Icon::Success,
            CheckStatus::Warning => Icon::Warning,
            CheckStatus::Error => Icon::Error,
        };
        out.push_str(&format!(
            "  {} {} - {}\n",
            icon.colored(color, unicode),
            item.name,
            item.message
        ));
        if let Some(rec) = &item.recommendation {
            out.push_str(&format!("    {} {}\n", Icon::Arrow.colored(color, unicode), rec));
        }
    }

    let (icon, title) = if result.errors > 0 {
        (Icon::Error, "Check FAILED")
    } else if result.warnings > 0 {
        (Icon::Warning, "Check passed with warnings")
    } else {
        (Icon::Success, "All checks passed")
    };
    out.push_str(&format!(
        "\n{} {}\n  {} passed, {} warnings, {} errors\n",
        icon.colored(color, unicode),
        bold(title, color),
        result.passed,
        result.warnings,
        result.errors
    ));
    out
}

pub fn check_json(result: &CheckResult, strict_warnings: bool) -> Value {
    let success = result.is_success() && !(strict_warnings && result.warnings > 0);
    json!({
        "event": "complete",
        "command": "check",
        "success": success,
        "passed": result.passed,
        "warnings": result.warnings,
        "errors": result.errors,
        "items": result.items,
    })
}

pub fn render_plan(
    graph: &StageGraph,
    waves: &[Vec<StageId>],
    layout: &ProjectLayout,
    image: &Path,
    color: bool,
) -> String {
    let mut out = String::new();
    out.push_str(&bold("Stages", color));
    out.push('\n');
    for (index, wave) in waves.iter().enumerate() {
        out.push_str(&format!("  wave {}\n", index + 1));
        for stage in wave {
            out.push_str(&format!("    {:<9} {}\n", stage.as_str(), stage.description()));
            for edge in graph.edges().iter().filter(|e| e.to == *stage) {
                out.push_str(&format!(
                    "              {}\n",
                    dim(&format!("<- {} ({})", edge.from, edge.artifact.as_str()), color)
                ));
            }
        }
    }

    out.push('\n');
    out.push_str(&bold("Layout", color));
    out.push('\n');
    for (key, value) in layout_fields(layout, image) {
        out.push_str(&format!("  {:<12} {}\n", key, value));
    }
    out
}

pub fn plan_json(graph: &StageGraph, waves: &[Vec<StageId>], layout: &ProjectLayout, image: &Path) -> Value {
    let edges: Vec<Value> = graph
        .edges()
        .iter()
        .map(|e| json!({"from": e.from.as_str(), "to": e.to.as_str(), "artifact": e.artifact.as_str()}))
        .collect();
    let waves: Vec<Vec<&str>> = waves
        .iter()
        .map(|wave| wave.iter().map(StageId::as_str).collect())
        .collect();
    let layout: serde_json::Map<String, Value> = layout_fields(layout, image)
        .into_iter()
        .map(|(k, v)| (k.replace(' ', "_"), Value::String(v)))
        .collect();
    json!({
        "event": "plan",
        "command": "plan",
        "waves": waves,
        "edges": edges,
        "layout": layout,
    })
}

fn layout_fields(layout: &ProjectLayout, image: &Path) -> Vec<(&'static str, String)> {
    let static_root = match layout.static_root(image) {
        Ok(p) => p.display().to_string(),
        Err(e) => format!("invalid: {}", e),
    };
    let data_dirs = match layout.data_dir_paths(image) {
        Ok(dirs) => dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        Err(e) => format!("invalid: {}", e),
    };
    vec![
        ("convention", layout.convention().to_string()),
        ("image", image.display().to_string()),
        ("launch dir", layout.launch_dir(image).display().to_string()),
        ("entry point", layout.entry_point()),
        ("static root", static_root),
        ("data dirs", data_dirs),
    ]
}

pub fn render_launch_plan(plan: &LaunchPlan, color: bool, unicode: bool) -> String {
    let source = match plan.port_source {
        PortSource::Env => "from environment",
        PortSource::Default => "default",
    };
    let mut out = format!(
        "{} {}\n  Entry: {}\n  Port:  {} {}\n  Cwd:   {}\n  {} {}\n",
        Icon::Progress.colored(color, unicode),
        bold("Launch plan", color),
        plan.entry_point,
        plan.port,
        dim(&format!("({})", source), color),
        plan.cwd.display(),
        Icon::Command.colored(color, unicode),
        plan.argv.join(" ")
    );
    for (key, value) in &plan.env {
        out.push_str(&format!("  {}={}\n", key, value));
    }
    out
}

pub fn launch_plan_json(plan: &LaunchPlan, dry_run: bool) -> Value {
    json!({
        "event": if dry_run { "plan" } else { "launch" },
        "command": "launch",
        "image": plan.image.display().to_string(),
        "entry_point": plan.entry_point,
        "port": plan.port,
        "port_source": plan.port_source,
        "cwd": plan.cwd.display().to_string(),
        "argv": plan.argv,
        "env": plan.env.iter().map(|(k, v)| json!({"name": k, "value": v})).collect::<Vec<_>>(),
    })
}
