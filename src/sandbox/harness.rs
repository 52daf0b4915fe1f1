//! The fixed Python programs injected next to user code.
//!
//! All harness state lives in underscore-prefixed globals so it cannot
//! collide with anything a user would reasonably define. Run inputs are
//! bound as plain string globals before a program executes; each program
//! leaves its outcome behind as a JSON string global for the host to read.

/// Global bound to the (sanitized) user source before every run.
pub(super) const USER_SOURCE_GLOBAL: &str = "_USER_SOURCE";
/// Global bound to the (sanitized) test source before every run.
pub(super) const TEST_SOURCE_GLOBAL: &str = "_TEST_SOURCE";
/// Global bound to the requested group name, or `None`.
pub(super) const TARGET_GROUP_GLOBAL: &str = "_TARGET_GROUP";
/// Global bound to the requested case name, or `None`.
pub(super) const TARGET_CASE_GLOBAL: &str = "_TARGET_CASE";
/// JSON verdict left behind by [`PRECHECK_PROGRAM`].
pub(super) const PRECHECK_OUTPUT_GLOBAL: &str = "_PRECHECK_JSON";
/// JSON report left behind by [`DRIVER_PROGRAM`].
pub(super) const REPORT_OUTPUT_GLOBAL: &str = "_REPORT_JSON";

/// Executed once at boot: resolves every stdlib module the other programs
/// import, so readiness implies the first run cannot fail on imports.
pub(super) const BOOT_PROBE: &str = r#"
import sys
import json
import unittest
from io import StringIO
"#;

/// Deletes every test-group container left over from an earlier run.
///
/// Only `unittest.TestCase` subclasses are swept; ordinary variables and
/// functions are overwritten naturally when user code re-executes. Also pins
/// `__name__` so test groups always qualify under the synthetic main-module
/// marker, keeping diagnostic lines stable across runs.
pub(super) const RESET_PROGRAM: &str = r#"
import unittest as _unittest

__name__ = "__main__"

def _sweep_test_groups():
    # Function scope on purpose: a module-level loop would leave its own
    # variable bound to the last swept class, resurrecting it at discovery.
    for _k in list(globals().keys()):
        _v = globals()[_k]
        if isinstance(_v, type) and issubclass(_v, _unittest.TestCase) and _v is not _unittest.TestCase:
            del globals()[_k]

_sweep_test_groups()
"#;

/// Compile-only validation of the user source. Nothing is executed; a
/// failure is reported as a structured verdict rather than an exception.
pub(super) const PRECHECK_PROGRAM: &str = r#"
import json as _json

try:
    compile(_USER_SOURCE, "<user_code>", "exec")
    _PRECHECK_JSON = _json.dumps({"ok": True, "msg": "", "line": 0})
except SyntaxError as _e:
    _PRECHECK_JSON = _json.dumps({"ok": False, "msg": _e.msg or "invalid syntax", "line": _e.lineno or 0})
"#;

/// Injection, discovery, targeting, execution and capture in one program.
///
/// stdout stays redirected for the whole injection-and-execution window and
/// is restored in the `finally` no matter which path ran. The runner writes
/// its verbose per-case lines to a private stream which is returned verbatim
/// for the host-side parser.
pub(super) const DRIVER_PROGRAM: &str = r#"
import sys
import json
import unittest
from io import StringIO

_captured_stdout = StringIO()
_original_stdout = sys.stdout

_report = {
    "success": False,
    "casesRun": 0,
    "failureCount": 0,
    "errorCount": 0,
    "diagnosticOutput": "",
    "capturedStdout": "",
    "failureDetails": [],
    "errorDetails": [],
    "fatal": None,
}

try:
    sys.stdout = _captured_stdout

    exec(_USER_SOURCE, globals())
    exec(_TEST_SOURCE, globals())

    def _discover_groups():
        found = []
        for _name, _obj in list(globals().items()):
            if isinstance(_obj, type) and issubclass(_obj, unittest.TestCase) and _obj is not unittest.TestCase:
                found.append(_obj)
        return found

    _groups = _discover_groups()

    _suite = unittest.TestSuite()
    _loader = unittest.TestLoader()
    for _cls in _groups:
        if _TARGET_GROUP is not None and _cls.__name__ != _TARGET_GROUP:
            continue
        if _TARGET_CASE is not None:
            _suite.addTest(_cls(_TARGET_CASE))
        else:
            _suite.addTests(_loader.loadTestsFromTestCase(_cls))

    _stream = StringIO()
    _runner = unittest.TextTestRunner(stream=_stream, verbosity=2)
    _outcome = _runner.run(_suite)

    _report["casesRun"] = _outcome.testsRun
    _report["failureCount"] = len(_outcome.failures)
    _report["errorCount"] = len(_outcome.errors)
    _report["success"] = _outcome.wasSuccessful() and _outcome.testsRun > 0
    _report["diagnosticOutput"] = _stream.getvalue()

    for _case, _trace in _outcome.failures:
        _report["failureDetails"].append({"case": str(_case), "message": _trace})
    for _case, _trace in _outcome.errors:
        _report["errorDetails"].append({"case": str(_case), "message": _trace})
except SyntaxError as _e:
    _report["fatal"] = f"SyntaxError: {_e.msg} (line {_e.lineno})"
except Exception as _e:
    _report["fatal"] = f"{type(_e).__name__}: {_e}"
finally:
    sys.stdout = _original_stdout
    _report["capturedStdout"] = _captured_stdout.getvalue()

_REPORT_JSON = json.dumps(_report)
"#;
