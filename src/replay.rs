//! `fibertrace replay`: drive a recorded scenario through the engine.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use fibertrace_config::Config;
use fibertrace_core::{
    DetectionStatus, Engine, HookInstaller, HookSlot, Inspector, RendererDetector,
};
use fibertrace_protocols::{
    CommitObserver, CommitSummary, ComponentRecord, Identity, RendererInfo,
};
use fibertrace_testkit::{MemoryHost, Probe, Scenario};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::cli::OutputFormat;

/// Collects per-commit summaries for the report.
#[derive(Default)]
struct CommitLog {
    summaries: Mutex<Vec<CommitSummary>>,
}

impl CommitObserver for CommitLog {
    fn on_commit_complete(&self, summary: &CommitSummary) {
        self.summaries.lock().push(summary.clone());
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeResult {
    x: f64,
    y: f64,
    component: Option<Identity>,
    display_name: Option<String>,
    stack: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    commits: Vec<CommitSummary>,
    components: Vec<ComponentRecord>,
    probes: Vec<ProbeResult>,
}

pub(crate) fn run(
    config: &Config,
    scenario_path: &Path,
    extra_probes: &[Probe],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let content = fs::read_to_string(scenario_path)
        .with_context(|| format!("Failed to read scenario {}", scenario_path.display()))?;
    let scenario = Scenario::from_json(&content)
        .with_context(|| format!("Invalid scenario {}", scenario_path.display()))?;

    let report = replay(config, &scenario, extra_probes)?;
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Tree => render_tree(&report),
    };
    println!("{output}");
    Ok(())
}

fn replay(config: &Config, scenario: &Scenario, extra_probes: &[Probe]) -> anyhow::Result<Report> {
    let engine = Arc::new(Engine::new(config));
    let log = Arc::new(CommitLog::default());
    engine.add_observer(log.clone());

    let installer = HookInstaller::new(Arc::new(HookSlot::new()));
    let outcome = engine.attach(&installer)?;
    let Some(hook) = outcome.hook() else {
        bail!("Hook installation was deferred to {outcome:?}");
    };

    let info = scenario
        .renderer
        .clone()
        .unwrap_or_else(|| RendererInfo::development("react-dom", "18.3.1"));
    let host = Arc::new(MemoryHost::with_info(info));
    let renderer = host.inject_into(hook.as_ref());
    match RendererDetector::new(hook.clone(), &config.hook).poll() {
        DetectionStatus::Detected(renderers) => info!(?renderers, "Replaying scenario"),
        status => bail!("Renderer was not detected: {status:?}"),
    }
    if !engine
        .renderer_status(renderer)
        .is_some_and(|status| status.is_attached())
    {
        bail!("Renderer refused; set hook.allow_production to replay production bundles");
    }

    engine.set_surface(host.clone());
    host.play(hook.as_ref(), renderer, scenario);

    let inspector = Inspector::new(engine, host, None, config.selection.clone());
    let probes = scenario
        .probes
        .iter()
        .chain(extra_probes)
        .map(|probe| {
            let hit = inspector.get_component_at_point(probe.x, probe.y);
            ProbeResult {
                x: probe.x,
                y: probe.y,
                component: hit.as_ref().map(|r| r.id),
                display_name: hit.as_ref().map(|r| r.display_name.clone()),
                stack: hit
                    .map(|r| inspector.get_component_stack(r.id))
                    .unwrap_or_default(),
            }
        })
        .collect();

    let commits = log.summaries.lock().clone();
    Ok(Report {
        commits,
        components: inspector.get_all_components(),
        probes,
    })
}

fn render_tree(report: &Report) -> String {
    let mut out = String::new();
    for (n, summary) in report.commits.iter().enumerate() {
        let _ = writeln!(
            out,
            "commit {}: +{} ~{} -{}{}",
            n + 1,
            summary.mounted,
            summary.updated,
            summary.unmounted,
            if summary.extraction_failures > 0 {
                format!(" ({} partial)", summary.extraction_failures)
            } else {
                String::new()
            }
        );
    }

    let by_id: HashMap<Identity, &ComponentRecord> =
        report.components.iter().map(|r| (r.id, r)).collect();
    let mut stack: Vec<&ComponentRecord> = report
        .components
        .iter()
        .filter(|r| r.parent.is_none())
        .rev()
        .collect();
    while let Some(record) = stack.pop() {
        let marker = if record.is_logical_component { "" } else { "<>" };
        let _ = write!(
            out,
            "{}{}{} #{}",
            "  ".repeat(record.depth),
            marker,
            record.display_name,
            record.id
        );
        if let Some(key) = &record.key {
            let _ = write!(out, " key={key}");
        }
        if let Some(source) = &record.source {
            let _ = write!(out, " @ {source}");
        }
        out.push('\n');
        stack.extend(record.children.iter().rev().filter_map(|id| by_id.get(id).copied()));
    }

    for probe in &report.probes {
        let _ = match &probe.display_name {
            Some(name) => writeln!(
                out,
                "({}, {}) -> {} [{}]",
                probe.x,
                probe.y,
                name,
                probe.stack.join(" > ")
            ),
            None => writeln!(out, "({}, {}) -> none", probe.x, probe.y),
        };
    }
    out.trim_end().to_string()
}
