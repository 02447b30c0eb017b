use crate::error::{ToolError, ToolResult};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Job script shipped with the server; `JMP_TEMPLATE_PATH` replaces it.
pub const BUNDLED_TEMPLATE: &str = include_str!("../../templates/runner_readonly.jsl");

pub const INPUT_PLACEHOLDER: &str = "{{INPUT_PATH}}";
pub const INPUT_JSL_PLACEHOLDER: &str = "{{INPUT_JSL_PATH}}";
pub const OUTPUT_PLACEHOLDER: &str = "{{OUTPUT_PATH}}";

pub type JobParams = Map<String, Value>;

/// Files of one external run, all under `<temp-root>/<run-id>/`.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub input_path: PathBuf,
    pub input_jsl_path: PathBuf,
    pub job_path: PathBuf,
    pub output_path: PathBuf,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

impl JobHandle {
    fn new(temp_root: &Path, run_id: String) -> Self {
        let run_dir = temp_root.join(&run_id);
        let logs_dir = run_dir.join("logs");
        Self {
            input_path: run_dir.join("input.json"),
            input_jsl_path: run_dir.join("input.jsl"),
            job_path: run_dir.join("job.jsl"),
            output_path: run_dir.join("output.json"),
            stdout_path: logs_dir.join("stdout.txt"),
            stderr_path: logs_dir.join("stderr.txt"),
            run_dir,
            run_id,
        }
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.run_dir.join("logs")
    }
}

pub struct JobRenderer<'a> {
    temp_root: &'a Path,
    template_path: Option<&'a Path>,
}

impl<'a> JobRenderer<'a> {
    pub fn new(temp_root: &'a Path, template_path: Option<&'a Path>) -> Self {
        Self {
            temp_root,
            template_path,
        }
    }

    /// Create a fresh run directory holding the input descriptor and the rendered job script.
    pub async fn prepare(
        &self,
        action: &str,
        file_path: &Path,
        params: &JobParams,
    ) -> ToolResult<JobHandle> {
        let job = JobHandle::new(self.temp_root, uuid::Uuid::new_v4().to_string());
        let file_path = file_path.to_string_lossy();

        tokio::fs::create_dir_all(job.logs_dir())
            .await
            .map_err(|err| prepare_failed(&job, "create run directory", err))?;

        let descriptor = json!({
            "action": action,
            "filePath": file_path,
            "params": params,
        });
        let descriptor = serde_json::to_vec(&descriptor)
            .map_err(|err| prepare_failed(&job, "serialize input.json", err))?;
        tokio::fs::write(&job.input_path, descriptor)
            .await
            .map_err(|err| prepare_failed(&job, "write input.json", err))?;

        tokio::fs::write(
            &job.input_jsl_path,
            render_input_jsl(action, &file_path, params),
        )
        .await
        .map_err(|err| prepare_failed(&job, "write input.jsl", err))?;

        let template = self.load_template(&job).await?;
        let script = render_job(
            &template,
            &job.input_path,
            &job.input_jsl_path,
            &job.output_path,
        );
        tokio::fs::write(&job.job_path, script)
            .await
            .map_err(|err| prepare_failed(&job, "write job.jsl", err))?;

        Ok(job)
    }

    async fn load_template(&self, job: &JobHandle) -> ToolResult<String> {
        let Some(path) = self.template_path else {
            return Ok(BUNDLED_TEMPLATE.to_string());
        };
        tokio::fs::read_to_string(path).await.map_err(|err| {
            prepare_failed(job, "read job template", err)
                .with_detail("templatePath", path.display().to_string())
        })
    }
}

fn prepare_failed(job: &JobHandle, step: &str, err: impl std::fmt::Display) -> ToolError {
    ToolError::jmp_exec_failed(format!("Failed to prepare JMP job ({step})"))
        .with_detail("runId", job.run_id.as_str())
        .with_detail("hint", err.to_string())
}

/// Escape a value for use inside a double-quoted JSL string literal.
pub fn escape_jsl_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn jsl_literal(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(if *flag { "1" } else { "0" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(format!("\"{}\"", escape_jsl_string(s))),
        // JSL has no direct JSON literal; nested values travel as their JSON text.
        Value::Array(_) | Value::Object(_) => {
            Some(format!("\"{}\"", escape_jsl_string(&value.to_string())))
        }
    }
}

/// Render the input descriptor in the JSL dialect the job script `Include`s.
pub fn render_input_jsl(action: &str, file_path: &str, params: &JobParams) -> String {
    let mut lines = vec![
        "Names Default To Here(1);".to_string(),
        format!("action = \"{}\";", escape_jsl_string(action)),
        format!("filePath = \"{}\";", escape_jsl_string(file_path)),
        "params = Associative Array();".to_string(),
    ];
    for (key, value) in params {
        if let Some(literal) = jsl_literal(value) {
            lines.push(format!(
                "params[\"{}\"] = {literal};",
                escape_jsl_string(key)
            ));
        }
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn render_job(
    template: &str,
    input_path: &Path,
    input_jsl_path: &Path,
    output_path: &Path,
) -> String {
    template
        .replace(
            INPUT_PLACEHOLDER,
            &escape_jsl_string(&input_path.to_string_lossy()),
        )
        .replace(
            INPUT_JSL_PLACEHOLDER,
            &escape_jsl_string(&input_jsl_path.to_string_lossy()),
        )
        .replace(
            OUTPUT_PLACEHOLDER,
            &escape_jsl_string(&output_path.to_string_lossy()),
        )
}
