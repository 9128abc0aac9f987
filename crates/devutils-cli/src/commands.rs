//! Command handlers for CLI subcommands.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use devutils_core::{
    format_elapsed, DiagnosticExtractor, OutputLocator, Progress, RemarkFamily, TaskList,
};
use devutils_models::{BuildEvent, BuildTarget, Diagnostic, DocumentContext, OutputMode};
use devutils_runtime::{BuildEventHub, BuildMonitor, Runtime, SessionConfig};
use tracing::{debug, info};

use crate::cli::{Cli, Commands, OutputFormat};
use crate::error::{CliError, Result};
use crate::local_host::{resolve_compiler, LocalHost};

/// Execute a CLI command.
pub fn execute(cli: Cli) -> Result<()> {
    let mut config = SessionConfig::from_env();
    if let Some(dir) = cli.artifact_dir {
        config = config.with_artifact_dir(dir);
    }

    match cli.command {
        Commands::Diagnostics { log, remark, format } => {
            cmd_diagnostics(&log, remark.into(), format)
        }
        Commands::Locate {
            artifact,
            mode,
            function,
            line,
            format,
        } => cmd_locate(&artifact, mode.into(), function.as_deref(), line.as_deref(), format),
        Commands::Replay { events, output } => cmd_replay(&events, output.as_deref()),
        Commands::Show {
            file,
            line,
            mode,
            function,
            project,
            configuration,
            platform,
            compiler,
        } => {
            let project = project.unwrap_or_else(|| file_stem(&file));
            let mut document = DocumentContext::new(&file, line)
                .with_target(BuildTarget::new(project, configuration, platform));
            if let Some(function) = function {
                document = document.with_function(function);
            }
            cmd_show(document, mode.into(), compiler.as_deref(), config)
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(String::from)
        .unwrap_or_else(|| "unnamed".to_string())
}

fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extracts remarks from `text`, dropping repeats.
pub fn extract_unique(text: &str, family: RemarkFamily) -> Vec<Diagnostic> {
    let mut tasks = TaskList::new();
    for diagnostic in DiagnosticExtractor::new(family).extract(text) {
        tasks.add(diagnostic);
    }
    tasks.iter().cloned().collect()
}

fn cmd_diagnostics(log: &Path, family: RemarkFamily, format: OutputFormat) -> Result<()> {
    let text = read_lossy(log)?;
    let diagnostics = extract_unique(&text, family);
    info!(log = %log.display(), remark = family.id, count = diagnostics.len(), "scanned build log");

    match format {
        OutputFormat::Table => {
            if diagnostics.is_empty() {
                println!("No {} remarks found.", family.id);
                return Ok(());
            }

            println!("{:<40}  {:>6}  {:>6}  MESSAGE", "FILE", "LINE", "REASON");
            println!("{}", "-".repeat(80));
            for d in &diagnostics {
                println!(
                    "{:<40}  {:>6}  {:>6}  {}",
                    truncate(&d.file_path, 40),
                    d.line,
                    d.code,
                    d.raw_message
                );
            }
            println!("\n{} remark(s)", diagnostics.len());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&diagnostics)?);
        }
    }
    Ok(())
}

fn cmd_locate(
    artifact: &Path,
    mode: OutputMode,
    function: Option<&str>,
    line: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let text = read_lossy(artifact)?;
    let result = OutputLocator::new(mode).locate(&text, function.unwrap_or(""), line);

    match format {
        OutputFormat::Table => {
            println!("{}:{}", artifact.display(), result.cursor_line);
            println!("  Function anchor: {}", yes_no(result.function_anchor_found));
            println!("  Line anchor:     {}", yes_no(result.line_anchor_found));
            println!("  Offset:          {}", result.cursor_offset);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}

/// Parses a JSON-lines event recording. Blank lines are skipped.
pub fn parse_events(text: &str) -> Result<Vec<BuildEvent>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| CliError::InvalidInput(format!("event on line {}: {}", n + 1, e)))
        })
        .collect()
}

fn cmd_replay(events: &Path, output: Option<&Path>) -> Result<()> {
    let events = parse_events(&read_lossy(events)?)?;
    let log = match output {
        Some(path) => read_lossy(path)?,
        None => String::new(),
    };

    let host = LocalHost::for_replay(log);
    let mut monitor = BuildMonitor::new(BuildEventHub::default());
    debug!(count = events.len(), "replaying build events");

    for event in events {
        monitor.dispatch(&host, event);
        let state = monitor.tracker().state();
        if let Progress::Fraction(fraction) = state.progress() {
            debug!(
                completed = state.completed_projects,
                total = state.total_projects,
                fraction,
                "progress"
            );
        }
    }

    let tracker = monitor.tracker();
    if let Some(elapsed) = tracker.last_elapsed() {
        println!("Last build took {}", format_elapsed(elapsed));
    }
    println!(
        "{}/{} project(s) completed{}",
        tracker.state().completed_projects,
        tracker.state().total_projects,
        if tracker.state().has_error { ", with errors" } else { "" }
    );
    println!("{} remark(s) reported", monitor.tasks().len());
    Ok(())
}

fn cmd_show(
    document: DocumentContext,
    mode: OutputMode,
    compiler: Option<&Path>,
    config: SessionConfig,
) -> Result<()> {
    let compiler = resolve_compiler(compiler)?;
    info!(
        compiler = %compiler.display(),
        file = %document.path.display(),
        mode = %mode,
        "showing compiler output"
    );

    let hub = BuildEventHub::default();
    let host = Arc::new(LocalHost::new(document, compiler).with_hub(hub.clone()));
    let runtime = Runtime::with_hub(host, config, hub);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let located = rt.block_on(runtime.show_output(mode))?;

    if !located.location.function_anchor_found && !located.location.line_anchor_found {
        println!("  (no anchor found, showing top of file)");
    }
    debug!(session = %located.session, path = %located.path.display(), "session finished");
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "found"
    } else {
        "not found"
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devutils_models::BuildScope;

    #[test]
    fn test_parse_events() {
        let text = r#"{"kind":"build_begin","scope":"solution","contexts":[{"project":"engine"}]}

{"kind":"project_done","project":"engine","project_config":"Release","platform":"x64","solution_config":"Release","success":true}
{"kind":"build_done","scope":"solution"}
"#;
        let events = parse_events(text).unwrap();

        assert_eq!(events.len(), 3);
        assert!(events[1].is_project_done_for("engine"));
        assert!(matches!(
            events[2],
            BuildEvent::BuildDone {
                scope: BuildScope::Solution,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_events_reports_line() {
        let err = parse_events("{\"kind\":\"build_done\",\"scope\":\"solution\"}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_extract_unique_drops_repeats() {
        let log = "\
1>src\\mesh.cpp(88) : info C5002: loop not vectorized due to reason '1200'
2>src\\mesh.cpp(88) : info C5002: loop not vectorized due to reason '1200'
1>src\\mesh.cpp(91) : info C5002: loop not vectorized due to reason '1300'
";
        let found = extract_unique(log, RemarkFamily::LOOP_NOT_VECTORIZED);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].line, 88);
        assert_eq!(found[1].code, "1300");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a/very/long/path.cpp", 10), "...ath.cpp");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("src/engine.cpp")), "engine");
    }
}
