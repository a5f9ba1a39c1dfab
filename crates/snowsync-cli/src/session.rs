//! Interactive sync session
//!
//! The bridge keeps its state in memory, so one session is one process.
//! Bridge failures are printed and the session continues; only I/O on the
//! session streams ends it early.

use crate::command::{parse_command, Command, HELP};
use anyhow::Context;
use serde_json::Value;
use snowsync_artifact::LocalArtifact;
use snowsync_bridge::{
    ArtifactSyncBridge, CleanupOutcome, FieldIssues, InMemoryGateway, PushOutcome, PushReport,
    RecordGateway,
};
use snowsync_validation::CoherenceReport;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

const PROMPT: &str = "snowsync> ";

/// Whether the session keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// Read commands until `quit` or end of input
pub(crate) async fn run<G, R, W>(
    bridge: &ArtifactSyncBridge<G>,
    input: R,
    out: &mut W,
    interactive: bool,
) -> anyhow::Result<()>
where
    G: RecordGateway,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        if interactive {
            write!(out, "{PROMPT}")?;
            out.flush()?;
        }
        let Some(line) = lines.next_line().await.context("reading session input")? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        debug!(%command, "session command");
        if execute(bridge, command, out).await? == Flow::Quit {
            break;
        }
    }

    let unsynced = bridge
        .list_local()
        .into_iter()
        .filter(|a| !a.sync_status.is_synced())
        .count();
    if unsynced > 0 {
        warn!(unsynced, "session ended with unsynced artifacts");
    }
    Ok(())
}

/// Run one command, writing its result to `out`
pub(crate) async fn execute<G, W>(
    bridge: &ArtifactSyncBridge<G>,
    command: Command,
    out: &mut W,
) -> anyhow::Result<Flow>
where
    G: RecordGateway,
    W: Write,
{
    match command {
        Command::Pull { table, sys_id } => match bridge.pull(&table, &sys_id).await {
            Ok(artifact) => print_pulled(out, &artifact)?,
            Err(e) => writeln!(out, "error: {e}")?,
        },
        Command::PullId { sys_id } => match bridge.pull_by_sys_id(&sys_id).await {
            Ok(artifact) => print_pulled(out, &artifact)?,
            Err(e) => writeln!(out, "error: {e}")?,
        },
        Command::Push { sys_id } => match bridge.push(&sys_id).await {
            Ok(outcome) => print_push(out, &outcome)?,
            Err(e) => writeln!(out, "error: {e}")?,
        },
        Command::Status { sys_id } => match bridge.sync_status(&sys_id).await {
            Ok(report) => {
                writeln!(out, "{} ({}) [{}]", report.name, report.table, report.status)?;
                writeln!(out, "  path: {}", report.path.display())?;
                for file in &report.files {
                    let mark = if file.modified { "M" } else { " " };
                    writeln!(out, "  {mark} {} <- {}", file.filename, file.field)?;
                }
                for path in &report.missing {
                    writeln!(out, "  ! missing {}", path.display())?;
                }
                writeln!(out, "  last synced: {}", report.last_synced_at.to_rfc3339())?;
            }
            Err(e) => writeln!(out, "error: {e}")?,
        },
        Command::Validate { sys_id } => match bridge.validate_coherence(&sys_id).await {
            Ok(check) => {
                if check.is_clean() {
                    writeln!(out, "no findings")?;
                }
                print_coherence(out, &check.report)?;
                print_legacy(out, &check.legacy_issues)?;
            }
            Err(e) => writeln!(out, "error: {e}")?,
        },
        Command::List => {
            let artifacts = bridge.list_local();
            if artifacts.is_empty() {
                writeln!(out, "no local artifacts")?;
            }
            for artifact in artifacts {
                writeln!(
                    out,
                    "{}  {:<24} {:<18} {}",
                    artifact.sys_id, artifact.name, artifact.table, artifact.sync_status
                )?;
            }
        }
        Command::Cleanup { sys_id, force } => match bridge.cleanup(&sys_id, force).await {
            Ok(CleanupOutcome::Removed { path }) => writeln!(out, "removed {}", path.display())?,
            Ok(CleanupOutcome::Refused { status }) => writeln!(
                out,
                "artifact is {status}; push first or use 'cleanup {sys_id} --force'"
            )?,
            Ok(CleanupOutcome::NotTracked) => writeln!(out, "{sys_id} is not tracked")?,
            Err(e) => writeln!(out, "error: {e}")?,
        },
        Command::Tables => {
            for table in bridge.registry().list_supported_tables() {
                writeln!(out, "{table}")?;
            }
        }
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn print_pulled<W: Write>(out: &mut W, artifact: &LocalArtifact) -> anyhow::Result<()> {
    writeln!(
        out,
        "pulled {} '{}' into {}",
        artifact.type_label,
        artifact.name,
        artifact.path.display()
    )?;
    for file in &artifact.files {
        writeln!(out, "  {}", file.filename)?;
    }
    Ok(())
}

fn print_push<W: Write>(out: &mut W, outcome: &PushOutcome) -> anyhow::Result<()> {
    let report: &PushReport = match outcome {
        PushOutcome::NoChanges => {
            writeln!(out, "no changes")?;
            return Ok(());
        }
        PushOutcome::Pushed(r) => {
            writeln!(out, "pushed {}", r.fields.join(", "))?;
            r
        }
        PushOutcome::Rejected(r) => {
            writeln!(
                out,
                "remote rejected update of {}; status pending_upload",
                r.fields.join(", ")
            )?;
            r
        }
        PushOutcome::Blocked(r) => {
            writeln!(out, "blocked by validation policy; nothing sent")?;
            r
        }
    };
    for path in &report.missing {
        writeln!(out, "  ! missing {} (baseline kept)", path.display())?;
    }
    print_coherence(out, &report.coherence)?;
    print_legacy(out, &report.legacy_issues)
}

fn print_coherence<W: Write>(out: &mut W, report: &CoherenceReport) -> anyhow::Result<()> {
    for (rule, message) in report.errors() {
        writeln!(out, "  error   [{rule}] {message}")?;
    }
    for (rule, message) in report.warnings() {
        writeln!(out, "  warning [{rule}] {message}")?;
    }
    for (rule, message) in report.hints() {
        writeln!(out, "  hint    [{rule}] {message}")?;
    }
    Ok(())
}

fn print_legacy<W: Write>(out: &mut W, issues: &[FieldIssues]) -> anyhow::Result<()> {
    for field in issues {
        for issue in &field.issues {
            writeln!(out, "  legacy  [{}] {}", field.field, issue.message())?;
        }
    }
    Ok(())
}

/// In-memory gateway seeded from a JSON file
///
/// The file holds an array of `{"table": "...", "result": {...}}` objects,
/// the same `result` shape the Table API returns.
pub(crate) async fn load_fixtures(path: &Path) -> anyhow::Result<InMemoryGateway> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading fixtures {}", path.display()))?;
    parse_fixtures(&text).with_context(|| format!("parsing fixtures {}", path.display()))
}

fn parse_fixtures(text: &str) -> anyhow::Result<InMemoryGateway> {
    let entries: Vec<Value> = serde_json::from_str(text)?;
    let gateway = InMemoryGateway::new();
    for (index, entry) in entries.iter().enumerate() {
        let table = entry
            .get("table")
            .and_then(Value::as_str)
            .with_context(|| format!("entry {index} has no 'table'"))?;
        let record = snowsync_servicenow::gateway::parse_record(entry)
            .with_context(|| format!("entry {index}"))?;
        let sys_id = record
            .get("sys_id")
            .cloned()
            .with_context(|| format!("entry {index} has no 'sys_id'"))?;
        gateway.insert(table, &sys_id, record);
    }
    Ok(gateway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowsync_test_utils::{test_bridge, widget_record, WIDGET_SYS_ID, WIDGET_TABLE};
    use snowsync_validation::ValidationPolicy;

    async fn run_script(bridge: &ArtifactSyncBridge<impl RecordGateway>, script: &str) -> String {
        let mut out = Vec::new();
        run(bridge, script.as_bytes(), &mut out, false).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn pull_then_push_without_edits() {
        let t = test_bridge(ValidationPolicy::Advisory);
        t.gateway
            .insert(WIDGET_TABLE, WIDGET_SYS_ID, widget_record("<div>hi</div>", ""));

        let script = format!("pull {WIDGET_TABLE} {WIDGET_SYS_ID}\npush {WIDGET_SYS_ID}\nlist\n");
        let output = run_script(&t.bridge, &script).await;

        assert!(output.contains("pulled Test Widget 'Test Widget'"));
        assert!(output.contains("no changes"));
        assert!(output.contains(&format!("{WIDGET_SYS_ID}  Test Widget")));
        assert_eq!(t.gateway.update_count(), 0);
    }

    #[tokio::test]
    async fn errors_do_not_end_session() {
        let t = test_bridge(ValidationPolicy::Advisory);
        let output = run_script(&t.bridge, "push nope\nbogus\ntables\nquit\nlist\n").await;

        assert!(output.contains("error: "));
        assert!(output.contains("unknown command 'bogus'"));
        assert!(output.contains(WIDGET_TABLE));
        assert!(!output.contains("no local artifacts"), "quit stops reading");
    }

    #[tokio::test]
    async fn cleanup_reports_untracked() {
        let t = test_bridge(ValidationPolicy::Advisory);
        let output = run_script(&t.bridge, "cleanup abc --force\n").await;
        assert_eq!(output, "abc is not tracked\n");
    }

    #[test]
    fn fixtures_flatten_values() {
        let gateway = parse_fixtures(
            r#"[{"table": "sp_widget", "result": {"sys_id": "w1", "name": "W", "active": true}}]"#,
        )
        .unwrap();
        let record = gateway.record("sp_widget", "w1").unwrap();
        assert_eq!(record["active"], "true");
        assert_eq!(record["name"], "W");
    }

    #[test]
    fn fixture_without_sys_id_is_rejected() {
        let err = parse_fixtures(r#"[{"table": "t", "result": {"name": "x"}}]"#).unwrap_err();
        assert!(err.to_string().contains("sys_id"));
    }
}
