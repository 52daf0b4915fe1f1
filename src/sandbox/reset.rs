use rustpython_vm::VirtualMachine;

use super::harness;
use super::{ExecError, RuntimeState};

impl RuntimeState {
    /// Clears prior test-group definitions out of the shared namespace.
    ///
    /// The same scope is reused for every run in a process (rebooting the
    /// runtime is far too slow), so without this sweep a renamed or deleted
    /// test group from an earlier version of the test source would still be
    /// discovered and pollute the next result. Only test-group containers
    /// are removed; the user's own functions and classes are re-injected
    /// fresh on every run anyway.
    pub(super) fn reset_namespace(&self, vm: &VirtualMachine) -> Result<(), ExecError> {
        self.eval_program(vm, harness::RESET_PROGRAM, "<namespace_reset>")
    }
}
