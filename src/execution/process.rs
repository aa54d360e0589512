//! Backend that runs code with locally installed toolchains
//!
//! Each language maps to a [`RunnerConfig`]: the source is written to a
//! scratch directory, optionally compiled, then executed under a deadline.
//! No isolation is attempted beyond the scratch directory.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;

use super::{ExecutionBackend, ExecutionRequest, ExecutionResult};
use crate::config::{CommandSpec, ExecutionConfig, RunnerConfig};
use crate::error::{CodeChatError, Result};

/// Runs requests through the configured per-language toolchains
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    runners: BTreeMap<String, RunnerConfig>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl ProcessBackend {
    /// Create a backend from explicit settings
    pub fn new(
        runners: BTreeMap<String, RunnerConfig>,
        timeout: Duration,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            runners,
            timeout,
            max_output_bytes,
        }
    }

    /// Create a backend from the `execution` config section
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(
            config.runners.clone(),
            Duration::from_secs(config.timeout_seconds),
            config.max_output_bytes,
        )
    }

    async fn try_execute(&self, request: &ExecutionRequest) -> Result<String> {
        let runner = self.runners.get(&request.language_id).ok_or_else(|| {
            CodeChatError::Config(format!(
                "No runner configured for language: {}",
                request.language_id
            ))
        })?;

        let scratch = tempfile::Builder::new().prefix("codechat-run-").tempdir()?;
        let source = scratch.path().join(&runner.file_name);
        tokio::fs::write(&source, &request.code).await?;

        let work = async {
            if let Some(compile) = &runner.compile {
                let output = spawn(compile, &source, scratch.path()).await?;
                if !output.status.success() {
                    return Err(CodeChatError::CompileError(self.render(&output)).into());
                }
            }

            let output = spawn(&runner.run, &source, scratch.path()).await?;
            if !output.status.success() {
                return Err(CodeChatError::RuntimeError(self.render(&output)).into());
            }
            Ok::<_, anyhow::Error>(self.render(&output))
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(outcome) => outcome,
            Err(_) => Err(CodeChatError::Timeout {
                seconds: self.timeout.as_secs(),
            }
            .into()),
        }
    }

    fn render(&self, output: &Output) -> String {
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }
        if !output.status.success() {
            if let Some(code) = output.status.code() {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&format!("exit status: {}", code));
            }
        }
        truncate_output(text, self.max_output_bytes)
    }
}

/// Expand `{file}` and `{dir}` in a command argument
fn expand(arg: &str, source: &Path, dir: &Path) -> String {
    arg.replace("{file}", &source.to_string_lossy())
        .replace("{dir}", &dir.to_string_lossy())
}

async fn spawn(spec: &CommandSpec, source: &Path, dir: &Path) -> Result<Output> {
    let program = expand(&spec.program, source, dir);
    let args: Vec<String> = spec.args.iter().map(|a| expand(a, source, dir)).collect();

    tracing::debug!(%program, ?args, "Spawning runner");

    let output = Command::new(&program)
        .args(&args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| CodeChatError::Config(format!("Failed to start `{}`: {}", program, e)))?;

    Ok(output)
}

/// Cap `text` at `max_bytes`, cutting on a character boundary
pub(crate) fn truncate_output(mut text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("\n[output truncated]");
    text
}

#[async_trait]
impl ExecutionBackend for ProcessBackend {
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        match self.try_execute(request).await {
            Ok(output) => {
                ExecutionResult::success(request.language_id.as_str(), output, Utc::now())
            }
            Err(err) => {
                tracing::warn!(language = %request.language_id, "Run failed: {:#}", err);
                ExecutionResult::from_error(request.language_id.as_str(), &err, Utc::now())
            }
        }
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{ExecutionStatus, FailureKind};

    fn sh_runner(script_args: &[&str]) -> RunnerConfig {
        RunnerConfig {
            file_name: "main.sh".to_string(),
            compile: None,
            run: CommandSpec {
                program: "sh".to_string(),
                args: script_args.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn backend_with(id: &str, runner: RunnerConfig, timeout: Duration) -> ProcessBackend {
        let mut runners = BTreeMap::new();
        runners.insert(id.to_string(), runner);
        ProcessBackend::new(runners, timeout, 4096)
    }

    #[test]
    fn test_truncate_output_respects_char_boundary() {
        let text = "ééé".to_string();
        let out = truncate_output(text, 3);
        assert!(out.starts_with('é'));
        assert!(out.ends_with("[output truncated]"));
        assert_eq!(truncate_output("short".into(), 10), "short");
    }

    #[test]
    fn test_expand_placeholders() {
        let out = expand("{dir}/main", Path::new("/tmp/x/main.c"), Path::new("/tmp/x"));
        assert_eq!(out, "/tmp/x/main");
    }

    #[tokio::test]
    async fn test_unknown_language_is_unavailable() {
        let backend = ProcessBackend::new(BTreeMap::new(), Duration::from_secs(5), 1024);
        let result = backend
            .execute(&ExecutionRequest::new("cobol", "DISPLAY 'HI'", Utc::now()))
            .await;
        assert_eq!(
            result.status,
            ExecutionStatus::Failure(FailureKind::Unavailable)
        );
        assert!(result.output_text.contains("cobol"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_run_captures_stdout() {
        let backend = backend_with("shell", sh_runner(&["{file}"]), Duration::from_secs(10));
        let result = backend
            .execute(&ExecutionRequest::new("shell", "echo Hello World", Utc::now()))
            .await;
        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.output_text.trim(), "Hello World");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_runtime_failure() {
        let backend = backend_with("shell", sh_runner(&["{file}"]), Duration::from_secs(10));
        let result = backend
            .execute(&ExecutionRequest::new(
                "shell",
                "echo boom >&2\nexit 3",
                Utc::now(),
            ))
            .await;
        assert_eq!(
            result.status,
            ExecutionStatus::Failure(FailureKind::Runtime)
        );
        assert!(result.output_text.contains("boom"));
        assert!(result.output_text.contains("exit status: 3"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_compile_step_is_compile_failure() {
        let mut runner = sh_runner(&["{file}"]);
        runner.compile = Some(CommandSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo syntax error >&2; exit 1".to_string()],
        });
        let backend = backend_with("shell", runner, Duration::from_secs(10));
        let result = backend
            .execute(&ExecutionRequest::new("shell", "echo never", Utc::now()))
            .await;
        assert_eq!(
            result.status,
            ExecutionStatus::Failure(FailureKind::Compile)
        );
        assert!(result.output_text.contains("syntax error"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_deadline_produces_timeout() {
        let backend = backend_with("shell", sh_runner(&["{file}"]), Duration::from_millis(200));
        let result = backend
            .execute(&ExecutionRequest::new("shell", "sleep 5", Utc::now()))
            .await;
        assert_eq!(result.status, ExecutionStatus::Timeout);
    }
}
