use rustpython_vm::VirtualMachine;
use serde::Deserialize;

use super::{CaseDetail, ExecError, RunRequest, RunResult, RuntimeState, harness, parser};

/// Shape of the JSON report the driver program leaves behind.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    success: bool,
    cases_run: u32,
    failure_count: u32,
    error_count: u32,
    diagnostic_output: String,
    captured_stdout: String,
    failure_details: Vec<CaseDetail>,
    error_details: Vec<CaseDetail>,
    fatal: Option<String>,
}

impl RuntimeState {
    /// Binds the run inputs as plain string globals for the harness
    /// programs. Sources are bound as data, never interpolated into code.
    pub(super) fn bind_run_inputs(
        &self,
        vm: &VirtualMachine,
        user_source: &str,
        test_source: &str,
        request: &RunRequest,
    ) -> Result<(), ExecError> {
        self.set_global_str(vm, harness::USER_SOURCE_GLOBAL, user_source)?;
        self.set_global_str(vm, harness::TEST_SOURCE_GLOBAL, test_source)?;
        self.set_global_opt_str(
            vm,
            harness::TARGET_GROUP_GLOBAL,
            request.target_group.as_deref(),
        )?;
        self.set_global_opt_str(
            vm,
            harness::TARGET_CASE_GLOBAL,
            request.target_case.as_deref(),
        )
    }

    /// Injects both sources into the shared namespace, discovers and narrows
    /// the suite, executes it with capture, and reconstructs the per-case
    /// list from the diagnostic stream.
    pub(super) fn run_suite(&self, vm: &VirtualMachine) -> Result<RunResult, ExecError> {
        self.eval_program(vm, harness::DRIVER_PROGRAM, "<test_driver>")?;
        let raw = self.read_global_string(vm, harness::REPORT_OUTPUT_GLOBAL)?;

        let report: RawReport = serde_json::from_str(&raw).map_err(|e| ExecError::Host {
            message: format!("malformed runtime report: {e}"),
        })?;

        Ok(build_result(report))
    }
}

fn build_result(report: RawReport) -> RunResult {
    if let Some(fatal) = report.fatal {
        // The run never started; only the captured stdout from the partial
        // injection window is preserved.
        return RunResult {
            captured_stdout: report.captured_stdout,
            syntax_or_fatal_error: Some(fatal),
            ..Default::default()
        };
    }

    let cases = parser::parse_cases(&report.diagnostic_output);

    RunResult {
        success: report.success,
        cases_run: report.cases_run,
        failure_count: report.failure_count,
        error_count: report.error_count,
        diagnostic_output: report.diagnostic_output,
        captured_stdout: report.captured_stdout,
        failure_details: report.failure_details,
        error_details: report.error_details,
        syntax_or_fatal_error: None,
        cases,
    }
}
