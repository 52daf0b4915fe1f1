mod engine;
mod harness;
mod init;
pub mod parser;
mod precheck;
mod reset;
pub mod sanitize;

use rustpython_vm::Interpreter;
use rustpython_vm::scope::Scope;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One run request, owned by the caller and immutable for the duration of
/// the call. `target_case` narrows execution to a single case and is only
/// meaningful together with `target_group`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub user_source: String,
    pub test_source: String,
    pub target_group: Option<String>,
    pub target_case: Option<String>,
}

impl RunRequest {
    pub fn new(user_source: impl Into<String>, test_source: impl Into<String>) -> Self {
        Self {
            user_source: user_source.into(),
            test_source: test_source.into(),
            target_group: None,
            target_case: None,
        }
    }

    pub fn with_target(mut self, group: &str, case: Option<&str>) -> Self {
        self.target_group = Some(group.to_string());
        self.target_case = case.map(str::to_string);
        self
    }

    pub fn validate(&self) -> Result<(), ExecError> {
        if self.target_case.is_some() && self.target_group.is_none() {
            return Err(ExecError::Runtime {
                kind: "ValueError".to_string(),
                message: "targetCase requires targetGroup".to_string(),
            });
        }
        Ok(())
    }
}

/// Identifies one test case as `group_name.case_name`, stable across runs
/// as long as the sources do not change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseIdentity {
    pub group_name: String,
    pub case_name: String,
}

impl TestCaseIdentity {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.group_name, self.case_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseOutcome {
    Ok,
    Fail,
    Error,
}

/// One line of the diagnostic stream, reconstructed by the output parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCaseResult {
    pub identity: TestCaseIdentity,
    pub outcome: CaseOutcome,
}

/// A failure or error record as reported by the test runner: the runner's
/// free-text case label plus the traceback text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDetail {
    pub case: String,
    pub message: String,
}

/// The structured result returned for every run. All errors are converted
/// into this shape; the entry point never propagates an exception.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub success: bool,
    pub cases_run: u32,
    pub failure_count: u32,
    pub error_count: u32,
    pub diagnostic_output: String,
    pub captured_stdout: String,
    pub failure_details: Vec<CaseDetail>,
    pub error_details: Vec<CaseDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax_or_fatal_error: Option<String>,
    /// Per-case outcomes derived from `diagnostic_output`; empty on fatal.
    #[serde(default)]
    pub cases: Vec<ParsedCaseResult>,
}

impl RunResult {
    /// A result for a run that never started: counts are zero and both
    /// detail lists stay empty.
    pub fn fatal(error: &ExecError) -> Self {
        Self {
            syntax_or_fatal_error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

/// Error taxonomy of the execution protocol. Every variant ends up as data
/// in a `RunResult`, never as a propagated exception.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("Python environment is not ready. Please wait and try again.")]
    NotReady,
    /// The user source failed to compile; execution never started.
    #[error("SyntaxError: {message} (line {line})")]
    Syntax { message: String, line: u32 },
    /// A runtime exception raised while defining code or driving the suite,
    /// before any per-case result existed.
    #[error("{kind}: {message}")]
    Runtime { kind: String, message: String },
    /// The call into the interpreter itself failed in a way that does not
    /// map onto a single Python exception.
    #[error("{message}")]
    Host { message: String },
}

/// Interpreter, shared namespace and readiness state for one process.
///
/// The embedded runtime is expensive to boot, so one `Sandbox` lives for the
/// whole process and the same scope is reused across runs; the namespace
/// reset protocol keeps stale test groups from leaking between them.
pub struct Sandbox {
    state: Option<RuntimeState>,
}

pub(crate) struct RuntimeState {
    interpreter: Interpreter,
    scope: Scope,
}

impl Sandbox {
    /// The sole execution entry point. Always resolves to a `RunResult`;
    /// callers never need exception handling.
    pub fn execute_tests(&self, request: &RunRequest) -> RunResult {
        let Some(state) = &self.state else {
            return RunResult::fatal(&ExecError::NotReady);
        };
        if let Err(e) = request.validate() {
            return RunResult::fatal(&e);
        }

        let user_source = sanitize::clean_source(&request.user_source);
        let test_source = sanitize::clean_source(&request.test_source);

        state.interpreter.enter(|vm| {
            state
                .bind_run_inputs(vm, &user_source, &test_source, request)
                .and_then(|_| state.reset_namespace(vm))
                .and_then(|_| state.precheck(vm))
                .and_then(|_| state.run_suite(vm))
                .unwrap_or_else(|e| RunResult::fatal(&e))
        })
    }
}
