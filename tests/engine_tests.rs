//! End-to-end tests of the execution protocol against the real embedded
//! runtime. Booting an interpreter is the expensive part, so scenarios are
//! grouped and each group reuses one sandbox, which also exercises the
//! namespace reset between runs the way the service does.

use pretty_assertions::assert_eq;
use pydrill::sandbox::{CaseOutcome, RunRequest, RunResult, Sandbox, parser};

const GREET_SOLUTION: &str = "def greet(name):\n    return f\"Hello, {name}!\"\n";

const GREET_TESTS: &str = r#"import unittest

class TestGreet(unittest.TestCase):
    def test_basic_name(self):
        self.assertEqual(greet("Alice"), "Hello, Alice!")

    def test_world(self):
        self.assertEqual(greet("World"), "Hello, World!")

if __name__ == "__main__":
    unittest.main()
"#;

fn booted() -> Sandbox {
    let mut sandbox = Sandbox::new();
    assert!(sandbox.initialize(), "runtime failed to boot");
    assert!(sandbox.is_ready());
    sandbox
}

fn qualified_names(result: &RunResult) -> Vec<String> {
    result
        .cases
        .iter()
        .map(|c| c.identity.qualified())
        .collect()
}

#[test]
fn round_trip_reruns_and_stdout_capture() {
    let sandbox = booted();
    let request = RunRequest::new(GREET_SOLUTION, GREET_TESTS);

    let first = sandbox.execute_tests(&request);
    assert_eq!(first.syntax_or_fatal_error, None);
    assert!(first.success);
    assert_eq!(first.cases_run, 2);
    assert_eq!(first.failure_count, 0);
    assert_eq!(first.error_count, 0);

    // Every case appears exactly once in the parsed list.
    let mut names = qualified_names(&first);
    names.sort();
    assert_eq!(
        names,
        vec!["TestGreet.test_basic_name", "TestGreet.test_world"]
    );
    assert!(first.cases.iter().all(|c| c.outcome == CaseOutcome::Ok));

    // Running the identical request again must not leak anything from the
    // first run into the counts.
    let second = sandbox.execute_tests(&request);
    assert_eq!(second.cases_run, first.cases_run);
    assert_eq!(second.failure_count, first.failure_count);
    assert_eq!(second.error_count, first.error_count);

    // A renamed group replaces the old one entirely: the stale container
    // must not resurface in discovery.
    let renamed_tests = r#"import unittest

class TestHello(unittest.TestCase):
    def test_alice(self):
        self.assertEqual(greet("Alice"), "Hello, Alice!")
"#;
    let renamed = sandbox.execute_tests(&RunRequest::new(GREET_SOLUTION, renamed_tests));
    assert!(renamed.success);
    assert_eq!(renamed.cases_run, 1);
    assert!(
        renamed
            .cases
            .iter()
            .all(|c| c.identity.group_name == "TestHello"),
        "stale TestGreet leaked into {:?}",
        qualified_names(&renamed)
    );

    // Print-style side effects land in the captured buffer, both at module
    // level and from inside a test case, and never pollute the diagnostic
    // stream the parser reads.
    let chatty_solution = "\
print(\"module import side effect\")

def greet(name):
    print(\"greeting \" + name)
    return f\"Hello, {name}!\"
";
    let chatty = sandbox.execute_tests(&RunRequest::new(chatty_solution, GREET_TESTS));
    assert!(chatty.success);
    assert!(chatty.captured_stdout.contains("module import side effect"));
    assert!(chatty.captured_stdout.contains("greeting Alice"));
    assert!(!chatty.diagnostic_output.contains("module import side effect"));
    assert_eq!(chatty.cases.len(), 2);
}

#[test]
fn failing_and_erroring_cases_are_reported_per_case() {
    let sandbox = booted();

    // Missing function on a fresh namespace: both cases error with a
    // NameError. This has to run before anything defines `greet`, because
    // user definitions legitimately persist across runs (only test groups
    // are swept by the reset).
    let errored = sandbox.execute_tests(&RunRequest::new("x = 1\n", GREET_TESTS));
    assert!(!errored.success);
    assert_eq!(errored.cases_run, 2);
    assert_eq!(errored.failure_count, 0);
    assert_eq!(errored.error_count, 2);
    assert!(errored.failure_details.is_empty());
    assert_eq!(errored.error_details.len(), 2);
    assert!(errored.cases.iter().all(|c| c.outcome == CaseOutcome::Error));
    assert!(
        errored
            .error_details
            .iter()
            .all(|d| d.message.contains("NameError"))
    );

    // Wrong behavior: both cases fail on the assertion.
    let wrong_solution = "def greet(name):\n    return name\n";
    let failed = sandbox.execute_tests(&RunRequest::new(wrong_solution, GREET_TESTS));
    assert!(!failed.success);
    assert_eq!(failed.cases_run, 2);
    assert_eq!(failed.failure_count, 2);
    assert_eq!(failed.error_count, 0);
    assert_eq!(failed.failure_details.len(), 2);
    assert!(failed.error_details.is_empty());
    assert!(failed.cases.iter().all(|c| c.outcome == CaseOutcome::Fail));

    // Each parsed case correlates to a traceback record.
    for case in &failed.cases {
        let detail = parser::find_detail(
            &case.identity,
            &failed.failure_details,
            &failed.error_details,
        );
        assert!(detail.is_some(), "no detail for {}", case.identity.qualified());
        assert!(detail.unwrap().message.contains("AssertionError"));
    }

    // The stale `greet` from the previous run is still defined, so omitting
    // it now produces assertion failures rather than NameErrors: ordinary
    // globals are overwritten by re-execution, never swept.
    let stale = sandbox.execute_tests(&RunRequest::new("x = 1\n", GREET_TESTS));
    assert_eq!(stale.failure_count, 2);
    assert_eq!(stale.error_count, 0);
}

#[test]
fn targeting_narrows_the_suite() {
    let sandbox = booted();

    let solution = "\
def greet(name):
    return f\"Hello, {name}!\"

def shout(text):
    return text.upper() + \"!\"
";
    let tests = r#"import unittest

class TestGreet(unittest.TestCase):
    def test_basic_name(self):
        self.assertEqual(greet("Alice"), "Hello, Alice!")

    def test_world(self):
        self.assertEqual(greet("World"), "Hello, World!")

class TestShout(unittest.TestCase):
    def test_upper(self):
        self.assertEqual(shout("hi"), "HI!")
"#;

    let everything = sandbox.execute_tests(&RunRequest::new(solution, tests));
    assert!(everything.success);
    assert_eq!(everything.cases_run, 3);

    let one_group =
        sandbox.execute_tests(&RunRequest::new(solution, tests).with_target("TestGreet", None));
    assert_eq!(one_group.cases_run, 2);
    assert!(
        one_group
            .cases
            .iter()
            .all(|c| c.identity.group_name == "TestGreet")
    );

    let one_case = sandbox.execute_tests(
        &RunRequest::new(solution, tests).with_target("TestShout", Some("test_upper")),
    );
    assert!(one_case.success);
    assert_eq!(one_case.cases_run, 1);
    assert_eq!(one_case.cases[0].identity.qualified(), "TestShout.test_upper");

    // A group name matching nothing selects an empty suite, which is not a
    // success even though nothing failed.
    let nothing =
        sandbox.execute_tests(&RunRequest::new(solution, tests).with_target("TestNope", None));
    assert_eq!(nothing.cases_run, 0);
    assert!(!nothing.success);
    assert!(nothing.cases.is_empty());
}

#[test]
fn fatal_paths_never_start_the_run() {
    let sandbox = booted();

    // Unparseable user code is caught by the precheck: nothing executes,
    // so there is no captured output at all.
    let broken = sandbox.execute_tests(&RunRequest::new(
        "def greet(name:\n    return name\n",
        GREET_TESTS,
    ));
    assert!(!broken.success);
    let fatal = broken.syntax_or_fatal_error.expect("expected a fatal error");
    assert!(fatal.starts_with("SyntaxError:"), "got {fatal}");
    assert!(fatal.contains("(line"), "got {fatal}");
    assert_eq!(broken.cases_run, 0);
    assert_eq!(broken.captured_stdout, "");
    assert_eq!(broken.diagnostic_output, "");
    assert!(broken.failure_details.is_empty());
    assert!(broken.error_details.is_empty());
    assert!(broken.cases.is_empty());

    // Code that parses but explodes while being defined is an
    // injection-time fatal, reported as kind and message.
    let exploding = sandbox.execute_tests(&RunRequest::new(
        "raise ValueError(\"boom\")\n",
        GREET_TESTS,
    ));
    assert_eq!(
        exploding.syntax_or_fatal_error.as_deref(),
        Some("ValueError: boom")
    );
    assert_eq!(exploding.cases_run, 0);

    // The sandbox stays usable after fatals.
    let recovered = sandbox.execute_tests(&RunRequest::new(GREET_SOLUTION, GREET_TESTS));
    assert!(recovered.success);
    assert_eq!(recovered.cases_run, 2);

    // Malformed targeting resolves as data too, never as a panic.
    let invalid = sandbox.execute_tests(&RunRequest {
        user_source: GREET_SOLUTION.to_string(),
        test_source: GREET_TESTS.to_string(),
        target_group: None,
        target_case: Some("test_world".to_string()),
    });
    assert!(
        invalid
            .syntax_or_fatal_error
            .as_deref()
            .is_some_and(|m| m.contains("targetCase requires targetGroup"))
    );
}

#[test]
fn unbooted_sandbox_short_circuits() {
    let sandbox = Sandbox::new();
    assert!(!sandbox.is_ready());

    let result = sandbox.execute_tests(&RunRequest::new(GREET_SOLUTION, GREET_TESTS));
    assert_eq!(
        result.syntax_or_fatal_error.as_deref(),
        Some("Python environment is not ready. Please wait and try again.")
    );
    assert_eq!(result.cases_run, 0);
    assert_eq!(result.captured_stdout, "");
}
