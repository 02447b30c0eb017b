//! External JMP execution.
//!
//! This is the trust boundary with an untrusted program: every way it can misbehave (failing
//! to start, hanging, crashing, writing garbage, reporting its own error) maps to a distinct
//! [`ToolError`] instead of leaking process-layer failures.

mod job;

pub use job::{
    escape_jsl_string, render_input_jsl, render_job, JobHandle, JobParams, JobRenderer,
    BUNDLED_TEMPLATE,
};

use crate::config::JmpConfig;
use crate::error::{ToolError, ToolResult};
use jmp_protocol::{codes, tail_text, STDERR_TAIL_BYTES};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tokio::time::timeout;

/// How a launched child finished.
#[derive(Debug)]
enum ProcessOutcome {
    Exited(ExitStatus),
    TimedOut,
}

#[derive(Debug, Default, Deserialize)]
struct DeclaredError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<Map<String, Value>>,
}

pub struct JmpRunner<'a> {
    config: &'a JmpConfig,
}

impl<'a> JmpRunner<'a> {
    pub fn new(config: &'a JmpConfig) -> Self {
        Self { config }
    }

    /// Run `action` against `file_path` and parse the program's JSON object output as `T`.
    ///
    /// A result that does not fit `T` counts as a failed run for logging and retention.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        action: &str,
        file_path: &Path,
        params: &JobParams,
    ) -> ToolResult<T> {
        let exe_path = self
            .config
            .exe_path
            .as_deref()
            .ok_or_else(|| ToolError::jmp_exec_failed("JMP_EXE_PATH is not configured"))?;

        let job = JobRenderer::new(&self.config.temp_root, self.config.template_path.as_deref())
            .prepare(action, file_path, params)
            .await?;
        log::debug!(
            "jmp run {} started (action={action}, file={})",
            job.run_id,
            file_path.display()
        );

        let result = self
            .run_job(exe_path, &job)
            .await
            .and_then(|output| parse_result(action, &job.run_id, output));
        match &result {
            Ok(_) => log::debug!("jmp run {} succeeded", job.run_id),
            Err(err) => log::warn!("jmp run {} failed: {err}", job.run_id),
        }
        self.apply_retention(&job, result.is_ok()).await;
        result
    }

    async fn run_job(&self, exe_path: &Path, job: &JobHandle) -> ToolResult<Map<String, Value>> {
        let child = spawn_redirected(exe_path, job).map_err(|err| {
            ToolError::jmp_exec_failed("Failed to launch JMP")
                .with_detail("runId", job.run_id.as_str())
                .with_detail("exePath", exe_path.display().to_string())
                .with_detail("hint", err.to_string())
        })?;

        let status = match wait_with_timeout(child, self.config.timeout).await {
            Ok(ProcessOutcome::Exited(status)) => status,
            Ok(ProcessOutcome::TimedOut) => {
                let timeout_sec = self.config.timeout.as_secs();
                return Err(ToolError::jmp_timeout("JMP execution timed out")
                    .with_detail("runId", job.run_id.as_str())
                    .with_detail("stderrTail", read_stderr_tail(job).await)
                    .with_detail("timeoutSec", timeout_sec)
                    .with_detail(
                        "hint",
                        format!("JMP did not finish within {timeout_sec}s and was killed"),
                    ));
            }
            Err(err) => {
                return Err(ToolError::jmp_exec_failed("Failed to wait for JMP")
                    .with_detail("runId", job.run_id.as_str())
                    .with_detail("hint", err.to_string()));
            }
        };

        if !status.success() {
            return Err(ToolError::jmp_exec_failed("JMP execution failed")
                .with_detail("runId", job.run_id.as_str())
                .with_detail("exitCode", exit_code_value(&status))
                .with_detail("stderrTail", read_stderr_tail(job).await));
        }

        let raw = match tokio::fs::read(&job.output_path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::jmp_exec_failed("JMP did not produce output.json")
                    .with_detail("runId", job.run_id.as_str())
                    .with_detail("exitCode", exit_code_value(&status)));
            }
            Err(err) => {
                return Err(ToolError::read_failed("Failed to read output.json")
                    .with_detail("runId", job.run_id.as_str())
                    .with_detail("hint", err.to_string()));
            }
        };

        classify_output(&job.run_id, &raw)
    }

    async fn apply_retention(&self, job: &JobHandle, succeeded: bool) {
        if self.config.retention.keeps(succeeded) {
            return;
        }
        if let Err(err) = tokio::fs::remove_dir_all(&job.run_dir).await {
            log::debug!(
                "failed to remove run directory {}: {err}",
                job.run_dir.display()
            );
        }
    }
}

fn spawn_redirected(exe_path: &Path, job: &JobHandle) -> std::io::Result<Child> {
    let stdout = std::fs::File::create(&job.stdout_path)?;
    let stderr = std::fs::File::create(&job.stderr_path)?;
    Command::new(exe_path)
        .arg(&job.job_path)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true)
        .spawn()
}

async fn wait_with_timeout(
    mut child: Child,
    limit: std::time::Duration,
) -> std::io::Result<ProcessOutcome> {
    let waited = timeout(limit, child.wait()).await;
    match waited {
        Ok(status) => status.map(ProcessOutcome::Exited),
        Err(_) => {
            if let Err(err) = child.kill().await {
                log::warn!("failed to kill timed out JMP process: {err}");
            }
            Ok(ProcessOutcome::TimedOut)
        }
    }
}

fn exit_code_value(status: &ExitStatus) -> Value {
    status.code().map(Value::from).unwrap_or(Value::Null)
}

async fn read_stderr_tail(job: &JobHandle) -> String {
    let bytes = tokio::fs::read(&job.stderr_path).await.unwrap_or_default();
    tail_text(&bytes, STDERR_TAIL_BYTES)
}

/// Split the program's output into the success shape (any object without `error`) or the
/// declared-error shape; everything else is a malformed result.
pub fn classify_output(run_id: &str, raw: &[u8]) -> ToolResult<Map<String, Value>> {
    let value: Value = serde_json::from_slice(raw).map_err(|err| {
        ToolError::jmp_exec_failed("output.json is not valid JSON")
            .with_detail("runId", run_id)
            .with_detail("hint", err.to_string())
    })?;

    let Value::Object(mut object) = value else {
        return Err(ToolError::jmp_exec_failed("output.json is not a JSON object")
            .with_detail("runId", run_id));
    };

    let Some(raw_error) = object.remove("error") else {
        return Ok(object);
    };

    let declared = match raw_error {
        Value::Null => DeclaredError::default(),
        Value::Object(_) => serde_json::from_value::<DeclaredError>(raw_error).map_err(|err| {
            ToolError::jmp_exec_failed("output.json has a malformed error")
                .with_detail("runId", run_id)
                .with_detail("hint", err.to_string())
        })?,
        other => {
            return Err(ToolError::jmp_exec_failed("output.json has a malformed error")
                .with_detail("runId", run_id)
                .with_detail("hint", format!("expected an object, got {other}")));
        }
    };

    let code = declared
        .code
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| codes::JMP_EXEC_FAILED.to_string());
    let message = declared
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "JSL reported an error".to_string());
    Err(ToolError::new(code, message)
        .with_details(declared.details.unwrap_or_default())
        .with_detail("runId", run_id))
}

/// Parse a success-shaped output object into the result type expected for `action`.
pub fn parse_result<T: DeserializeOwned>(
    action: &str,
    run_id: &str,
    output: Map<String, Value>,
) -> ToolResult<T> {
    serde_json::from_value(Value::Object(output)).map_err(|err| {
        ToolError::jmp_exec_failed(format!("JMP returned an unexpected {action} result"))
            .with_detail("runId", run_id)
            .with_detail("hint", err.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_object_passes_through() {
        let out = classify_output("r1", br#"{"rows": 1, "cols": 2}"#).unwrap();
        assert_eq!(Value::Object(out), json!({ "rows": 1, "cols": 2 }));
    }

    #[test]
    fn declared_error_keeps_code_message_and_details() {
        let raw = br#"{"error": {"code": "X", "message": "m", "details": {"col": 3, "runId": "fake"}}}"#;
        let err = classify_output("r1", raw).unwrap_err();
        assert_eq!(err.code(), "X");
        assert_eq!(err.message, "m");
        assert_eq!(err.details.get("col"), Some(&json!(3)));
        assert_eq!(err.details.get("runId"), Some(&json!("r1")));
    }

    #[test]
    fn declared_error_without_fields_uses_defaults() {
        for raw in [&br#"{"error": {}}"#[..], &br#"{"error": null}"#[..]] {
            let err = classify_output("r2", raw).unwrap_err();
            assert_eq!(err.code(), codes::JMP_EXEC_FAILED);
            assert_eq!(err.message, "JSL reported an error");
        }
    }

    #[test]
    fn malformed_shapes_are_exec_failures() {
        let cases: [(&[u8], &str); 4] = [
            (b"not json", "output.json is not valid JSON"),
            (b"[1, 2]", "output.json is not a JSON object"),
            (br#"{"error": "boom"}"#, "output.json has a malformed error"),
            (br#"{"error": {"code": 7}}"#, "output.json has a malformed error"),
        ];
        for (raw, message) in cases {
            let err = classify_output("r3", raw).unwrap_err();
            assert_eq!(err.code(), codes::JMP_EXEC_FAILED);
            assert_eq!(err.message, message);
            assert_eq!(err.details.get("runId"), Some(&json!("r3")));
        }
    }

    #[test]
    fn mismatched_success_shape_names_the_action_and_run() {
        let output = classify_output("r4", br#"{"unexpected": true}"#).unwrap();
        let err = parse_result::<std::collections::BTreeMap<String, u64>>("schema", "r4", output)
            .unwrap_err();
        assert_eq!(err.code(), codes::JMP_EXEC_FAILED);
        assert_eq!(err.message, "JMP returned an unexpected schema result");
        assert_eq!(err.details.get("runId"), Some(&json!("r4")));
        assert!(err.details.contains_key("hint"));
    }

    #[tokio::test]
    async fn missing_executable_config_fails_before_any_run_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let config = JmpConfig {
            temp_root: tmp.path().join("runs"),
            ..JmpConfig::default()
        };
        let err = JmpRunner::new(&config)
            .execute::<Map<String, Value>>("schema", Path::new("/d/t.jmp"), &JobParams::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::JMP_EXEC_FAILED);
        assert_eq!(err.message, "JMP_EXE_PATH is not configured");
        assert!(!tmp.path().join("runs").exists());
    }

    #[tokio::test]
    async fn unlaunchable_executable_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let config = JmpConfig {
            exe_path: Some(tmp.path().join("no-such-jmp")),
            temp_root: tmp.path().join("runs"),
            ..JmpConfig::default()
        };
        let err = JmpRunner::new(&config)
            .execute::<Map<String, Value>>("schema", Path::new("/d/t.jmp"), &JobParams::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::JMP_EXEC_FAILED);
        assert_eq!(err.message, "Failed to launch JMP");
        assert!(err.details.contains_key("runId"));
    }
}
