//! Mocked code execution.
//!
//! JavaScript is evaluated for real, in a child `node` process. The user's
//! code runs inside `new Function('console', code)` with a console that
//! records lines instead of printing them; the harness then writes a single
//! report line (prefixed with [`REPORT_MARKER`]) to stdout and exits, so
//! timers left pending by the code never hold the run open. Every other
//! language returns a canned placeholder.
//!
//! The child process is a capability boundary, not a sandbox: it has the
//! same filesystem and network access as the host. It is killed on timeout.

use serde::Deserialize;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::ExecutorConfig;
use crate::language::Language;
use crate::session::ExecutionResult;

/// Prefix of the harness's report line on stdout.
pub const REPORT_MARKER: &str = "\u{1e}__LCC_REPORT__";

/// Output text for a successful run that logged nothing.
pub const NO_OUTPUT: &str = "No output";

const HARNESS_TEMPLATE: &str = r#"'use strict';
const __lines = [];
const __fmt = (args) => args.map(String).join(' ');
const __console = {
  log: (...args) => { __lines.push(__fmt(args)); },
  error: (...args) => { __lines.push('Error: ' + __fmt(args)); },
  warn: (...args) => { __lines.push('Warning: ' + __fmt(args)); },
};
let __report;
try {
  const __fn = new Function('console', __SOURCE__);
  __fn(__console);
  __report = { ok: true, lines: __lines };
} catch (err) {
  __report = {
    ok: false,
    lines: __lines,
    error: err instanceof Error ? err.message : 'Unknown error',
  };
}
process.stdout.write('\n' + __MARKER__ + JSON.stringify(__report) + '\n', () => process.exit(0));
"#;

/// The harness's report, parsed from its marker line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HarnessReport {
    pub ok: bool,
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Build the JavaScript program that evaluates `code` with a captured console.
pub fn build_harness(code: &str) -> String {
    // JSON string literals are valid JavaScript string literals.
    let source = serde_json::to_string(code).unwrap_or_else(|_| "\"\"".to_string());
    let marker = serde_json::to_string(REPORT_MARKER).unwrap_or_else(|_| "\"\"".to_string());
    // Source goes in last so user code is never rescanned for placeholders.
    HARNESS_TEMPLATE
        .replace("__MARKER__", &marker)
        .replace("__SOURCE__", &source)
}

/// Find and parse the last report line in the harness's stdout.
pub fn parse_report(stdout: &str) -> Option<HarnessReport> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(REPORT_MARKER))
        .and_then(|json| serde_json::from_str(json).ok())
}

/// Turn a harness report into the result stored on the session.
pub fn report_to_result(report: HarnessReport, execution_time_ms: f64) -> ExecutionResult {
    if report.ok {
        let output = if report.lines.is_empty() {
            NO_OUTPUT.to_string()
        } else {
            report.lines.join("\n")
        };
        ExecutionResult::succeeded(output, execution_time_ms)
    } else {
        let error = report.error.unwrap_or_else(|| "Unknown error".to_string());
        ExecutionResult::failed(error, execution_time_ms)
    }
}

/// Placeholder output for languages that are not actually executed.
pub fn placeholder_output(language: Language) -> String {
    format!("[Mock execution for {}]\nHello, World!", language.label())
}

/// Evaluates session code. Never fails: problems become failed results.
#[derive(Debug, Clone, Default)]
pub struct CodeExecutor {
    config: ExecutorConfig,
}

impl CodeExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self, language: Language, code: &str) -> ExecutionResult {
        let start = Instant::now();
        if !language.is_directly_executable() {
            return ExecutionResult::succeeded(placeholder_output(language), elapsed_ms(start));
        }

        let result = self.run_javascript(code, start).await;
        tracing::debug!(
            target: "collab::executor",
            success = result.success,
            elapsed_ms = result.execution_time_ms,
            "javascript evaluation finished"
        );
        result
    }

    async fn run_javascript(&self, code: &str, start: Instant) -> ExecutionResult {
        let program = &self.config.node_program;
        let mut child = match Command::new(program)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(
                    target: "collab::executor",
                    program = %program,
                    error = %e,
                    "javascript runtime unavailable"
                );
                return ExecutionResult::failed(
                    format!("JavaScript runtime '{}' unavailable: {}", program, e),
                    elapsed_ms(start),
                );
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(build_harness(code).as_bytes()).await {
                return ExecutionResult::failed(
                    format!("Failed to send code to '{}': {}", program, e),
                    elapsed_ms(start),
                );
            }
            // Dropping stdin closes the pipe so node starts evaluating.
        }

        let output = match tokio::time::timeout(self.config.timeout(), child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return ExecutionResult::failed(
                    format!("Failed to run '{}': {}", program, e),
                    elapsed_ms(start),
                );
            }
            Err(_) => {
                tracing::warn!(
                    target: "collab::executor",
                    timeout_ms = self.config.timeout_ms,
                    "javascript evaluation timed out"
                );
                return ExecutionResult::failed(
                    format!("Execution timed out after {}ms", self.config.timeout_ms),
                    elapsed_ms(start),
                );
            }
        };

        let elapsed = elapsed_ms(start);
        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_report(&stdout) {
            Some(report) => report_to_result(report, elapsed),
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let detail = stderr
                    .lines()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or("no report produced")
                    .trim()
                    .to_string();
                ExecutionResult::failed(detail, elapsed)
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn node_available() -> bool {
        std::process::Command::new("node")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    // -- harness ---------------------------------------------------------------

    #[test]
    fn test_build_harness_embeds_code_as_string_literal() {
        let harness = build_harness("console.log(\"hi\");\nthrow 1;");
        assert!(harness.contains(r#""console.log(\"hi\");\nthrow 1;""#));
        assert!(!harness.contains("__SOURCE__"));
        assert!(!harness.contains("__MARKER__"));
    }

    #[test]
    fn test_build_harness_wraps_in_function_scope() {
        let harness = build_harness("1");
        assert!(harness.contains("new Function('console'"));
    }

    #[test]
    fn test_build_harness_leaves_placeholder_text_in_user_code() {
        let harness = build_harness("// __MARKER__ __SOURCE__");
        assert!(harness.contains(r#""// __MARKER__ __SOURCE__""#));
    }

    // -- report parsing ------------------------------------------------------------

    #[test]
    fn test_parse_report_success() {
        let stdout = format!("noise\n{}{{\"ok\":true,\"lines\":[\"a\",\"b\"]}}\n", REPORT_MARKER);
        let report = parse_report(&stdout).unwrap();
        assert!(report.ok);
        assert_eq!(report.lines, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_report_uses_last_marker_line() {
        let stdout = format!(
            "{m}{{\"ok\":false,\"error\":\"fake\"}}\n{m}{{\"ok\":true,\"lines\":[]}}\n",
            m = REPORT_MARKER
        );
        assert!(parse_report(&stdout).unwrap().ok);
    }

    #[test]
    fn test_parse_report_missing() {
        assert!(parse_report("just output\n").is_none());
        assert!(parse_report(&format!("{}not json", REPORT_MARKER)).is_none());
    }

    #[test]
    fn test_report_to_result_joins_lines() {
        let r = report_to_result(
            HarnessReport { ok: true, lines: vec!["x".into(), "Error: y".into()], error: None },
            3.0,
        );
        assert!(r.success);
        assert_eq!(r.output, "x\nError: y");
        assert_eq!(r.execution_time_ms, 3.0);
    }

    #[test]
    fn test_report_to_result_empty_output() {
        let r = report_to_result(HarnessReport { ok: true, lines: vec![], error: None }, 0.0);
        assert_eq!(r.output, NO_OUTPUT);
    }

    #[test]
    fn test_report_to_result_failure() {
        let r = report_to_result(
            HarnessReport { ok: false, lines: vec!["before".into()], error: Some("boom".into()) },
            0.0,
        );
        assert!(!r.success);
        assert!(r.output.is_empty());
        assert_eq!(r.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_report_to_result_failure_without_message() {
        let r = report_to_result(HarnessReport { ok: false, lines: vec![], error: None }, 0.0);
        assert_eq!(r.error.as_deref(), Some("Unknown error"));
    }

    // -- placeholder languages -----------------------------------------------------

    #[tokio::test]
    async fn test_non_javascript_languages_return_placeholder() {
        let exec = CodeExecutor::default();
        for lang in Language::ALL.into_iter().filter(|l| !l.is_directly_executable()) {
            let r = exec.execute(lang, "anything at all").await;
            assert!(r.success, "{} should succeed", lang);
            assert!(r.output.contains(lang.label()), "output: {}", r.output);
            assert!(r.error.is_none());
        }
    }

    #[tokio::test]
    async fn test_missing_runtime_is_failed_result() {
        let exec = CodeExecutor::new(ExecutorConfig {
            node_program: "/nonexistent/lcc-node-binary".to_string(),
            timeout_ms: 1_000,
        });
        let r = exec.execute(Language::Javascript, "console.log(1)").await;
        assert!(!r.success);
        assert!(r.error.unwrap().contains("unavailable"));
    }

    // -- real evaluation (skipped when node is not installed) ------------------------

    #[tokio::test]
    async fn test_javascript_logs_are_captured() {
        if !node_available() {
            eprintln!("node not installed; skipping");
            return;
        }
        let exec = CodeExecutor::default();
        let r = exec
            .execute(
                Language::Javascript,
                "console.log('hello', 42); console.warn('careful'); console.error('bad');",
            )
            .await;
        assert!(r.success, "error: {:?}", r.error);
        assert_eq!(r.output, "hello 42\nWarning: careful\nError: bad");
    }

    #[tokio::test]
    async fn test_javascript_throw_is_failed_result() {
        if !node_available() {
            eprintln!("node not installed; skipping");
            return;
        }
        let exec = CodeExecutor::default();
        let r = exec
            .execute(Language::Javascript, "throw new Error('kaboom');")
            .await;
        assert!(!r.success);
        assert!(r.error.unwrap().contains("kaboom"));
    }

    #[tokio::test]
    async fn test_javascript_syntax_error_is_failed_result() {
        if !node_available() {
            eprintln!("node not installed; skipping");
            return;
        }
        let r = CodeExecutor::default()
            .execute(Language::Javascript, "function (")
            .await;
        assert!(!r.success);
        assert!(r.error.is_some());
    }

    #[tokio::test]
    async fn test_javascript_default_template_runs() {
        if !node_available() {
            eprintln!("node not installed; skipping");
            return;
        }
        let r = CodeExecutor::default()
            .execute(Language::Javascript, Language::Javascript.default_code())
            .await;
        assert!(r.success);
        assert_eq!(r.output, "Hello, World!");
    }

    #[tokio::test]
    async fn test_javascript_silent_code_reports_no_output() {
        if !node_available() {
            eprintln!("node not installed; skipping");
            return;
        }
        let r = CodeExecutor::default()
            .execute(Language::Javascript, "const x = 1 + 1;")
            .await;
        assert!(r.success);
        assert_eq!(r.output, NO_OUTPUT);
    }

    #[tokio::test]
    async fn test_javascript_pending_timers_do_not_hold_the_run() {
        if !node_available() {
            eprintln!("node not installed; skipping");
            return;
        }
        let exec = CodeExecutor::new(ExecutorConfig {
            node_program: "node".to_string(),
            timeout_ms: 1_000,
        });
        let r = exec
            .execute(Language::Javascript, "setInterval(() => {}, 100); console.log('hi');")
            .await;
        assert!(r.success, "error: {:?}", r.error);
        assert_eq!(r.output, "hi");

        let r = exec
            .execute(Language::Javascript, "setTimeout(() => {}, 60000); console.log('done');")
            .await;
        assert!(r.success, "error: {:?}", r.error);
        assert_eq!(r.output, "done");
    }

    #[test]
    fn test_build_harness_exits_after_report() {
        assert!(build_harness("1").contains("process.exit(0)"));
    }

    #[tokio::test]
    async fn test_javascript_timeout() {
        if !node_available() {
            eprintln!("node not installed; skipping");
            return;
        }
        let exec = CodeExecutor::new(ExecutorConfig {
            node_program: "node".to_string(),
            timeout_ms: 300,
        });
        let started = std::time::Instant::now();
        let r = exec.execute(Language::Javascript, "while (true) {}").await;
        assert!(!r.success);
        assert!(r.error.unwrap().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
