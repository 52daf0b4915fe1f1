use rustpython_vm::VirtualMachine;
use serde::Deserialize;

use super::harness;
use super::{ExecError, RuntimeState};

#[derive(Deserialize)]
struct PrecheckVerdict {
    ok: bool,
    msg: String,
    line: u32,
}

impl RuntimeState {
    /// Compile-only validation of the user source.
    ///
    /// Runs before any injection so code that cannot even parse fails fast
    /// and side-effect-free; the caller turns the error into a fatal
    /// `RunResult` and skips execution entirely.
    pub(super) fn precheck(&self, vm: &VirtualMachine) -> Result<(), ExecError> {
        self.eval_program(vm, harness::PRECHECK_PROGRAM, "<precheck>")?;
        let raw = self.read_global_string(vm, harness::PRECHECK_OUTPUT_GLOBAL)?;

        let verdict: PrecheckVerdict =
            serde_json::from_str(&raw).map_err(|e| ExecError::Host {
                message: format!("malformed precheck verdict: {e}"),
            })?;

        if verdict.ok {
            Ok(())
        } else {
            Err(ExecError::Syntax {
                message: verdict.msg,
                line: verdict.line,
            })
        }
    }
}
