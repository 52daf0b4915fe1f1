use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::{Result, anyhow};
use rustpython_vm::builtins::PyBaseExceptionRef;
use rustpython_vm::compiler::Mode;
use rustpython_vm::{Interpreter, PyObjectRef, Settings, VirtualMachine};

use super::harness;
use super::{ExecError, RuntimeState, Sandbox};

/// Exception kinds worth surfacing when a raw interpreter error has to be
/// trimmed down to a single relevant line.
const KNOWN_EXCEPTION_KINDS: &[&str] = &[
    "SyntaxError",
    "NameError",
    "TypeError",
    "ValueError",
    "IndentationError",
    "AttributeError",
];

impl Sandbox {
    pub fn new() -> Self {
        Self { state: None }
    }

    /// Boots the embedded interpreter with the frozen standard library.
    ///
    /// Idempotent on success. Returns `false` instead of panicking when the
    /// runtime fails to come up; execution calls then short-circuit with a
    /// fixed not-ready result.
    pub fn initialize(&mut self) -> bool {
        if self.state.is_some() {
            return true;
        }

        match catch_unwind(AssertUnwindSafe(RuntimeState::boot)) {
            Ok(Ok(state)) => {
                self.state = Some(state);
                true
            }
            Ok(Err(e)) => {
                log::error!("Failed to boot the Python runtime: {e:#}");
                false
            }
            Err(_) => {
                log::error!("Python runtime panicked during startup");
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeState {
    fn boot() -> Result<Self> {
        let interpreter = Interpreter::with_init(Settings::default(), |vm| {
            vm.add_native_modules(rustpython_stdlib::get_module_inits());
            vm.add_frozen(rustpython_pylib::FROZEN_STDLIB);
        });
        let scope = interpreter.enter(|vm| vm.new_scope_with_builtins());

        let state = Self { interpreter, scope };

        // Resolve the harness imports once up front: readiness means the
        // first real run will not trip over a missing stdlib module, and the
        // import work is paid during boot instead of on the first request.
        state
            .interpreter
            .enter(|vm| state.eval_program(vm, harness::BOOT_PROBE, "<boot_probe>"))
            .map_err(|e| anyhow!("harness imports unavailable: {e}"))?;

        Ok(state)
    }

    /// Compiles and executes one fixed harness program in the shared scope.
    pub(super) fn eval_program(
        &self,
        vm: &VirtualMachine,
        source: &str,
        origin: &str,
    ) -> Result<(), ExecError> {
        let code = vm
            .compile(source, Mode::Exec, origin.to_owned())
            .map_err(|err| ExecError::Host {
                message: format!("harness program {origin} failed to compile: {err}"),
            })?;

        vm.run_code_obj(code, self.scope.clone())
            .map(drop)
            .map_err(|exc| exec_error_from_py(vm, &exc))
    }

    pub(super) fn read_global_string(
        &self,
        vm: &VirtualMachine,
        name: &str,
    ) -> Result<String, ExecError> {
        let value = self
            .scope
            .globals
            .get_item(name, vm)
            .map_err(|exc| exec_error_from_py(vm, &exc))?;
        let text = value.str(vm).map_err(|exc| exec_error_from_py(vm, &exc))?;
        Ok(text.as_str().to_owned())
    }

    pub(super) fn set_global_str(
        &self,
        vm: &VirtualMachine,
        name: &str,
        value: &str,
    ) -> Result<(), ExecError> {
        self.scope
            .globals
            .set_item(name, vm.ctx.new_str(value).into(), vm)
            .map_err(|exc| exec_error_from_py(vm, &exc))
    }

    pub(super) fn set_global_opt_str(
        &self,
        vm: &VirtualMachine,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), ExecError> {
        let object: PyObjectRef = match value {
            Some(s) => vm.ctx.new_str(s).into(),
            None => vm.ctx.none(),
        };
        self.scope
            .globals
            .set_item(name, object, vm)
            .map_err(|exc| exec_error_from_py(vm, &exc))
    }
}

/// Converts an interpreter-level exception into the tagged error taxonomy,
/// trimming the rendered traceback to the most relevant single line when one
/// matches a known exception-kind prefix.
pub(super) fn exec_error_from_py(vm: &VirtualMachine, exc: &PyBaseExceptionRef) -> ExecError {
    let mut rendered = String::new();
    if vm.write_exception(&mut rendered, exc).is_err() {
        return ExecError::Host {
            message: "unprintable interpreter exception".to_string(),
        };
    }

    match most_relevant_line(&rendered) {
        Some(line) => match line.split_once(": ") {
            Some((kind, message)) => ExecError::Runtime {
                kind: kind.to_string(),
                message: message.to_string(),
            },
            None => ExecError::Host {
                message: line.to_string(),
            },
        },
        None => ExecError::Host {
            message: rendered.trim().to_string(),
        },
    }
}

fn most_relevant_line(rendered: &str) -> Option<&str> {
    rendered
        .lines()
        .map(str::trim_end)
        .find(|line| KNOWN_EXCEPTION_KINDS.iter().any(|kind| line.starts_with(kind)))
}
