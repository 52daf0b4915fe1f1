//! Reconstructs per-case results from the runner's diagnostic stream.
//!
//! The runner emits one line per case in the form
//! `caseName (qualifiedGroupName) ... ok|FAIL|ERROR`. The qualified group
//! name can carry a synthetic module prefix and, on newer runtimes, the case
//! name again as a trailing path segment; both are stripped to recover the
//! bare group name.

use lazy_static::lazy_static;
use regex::Regex;

use super::{CaseDetail, CaseOutcome, ParsedCaseResult, TestCaseIdentity};

lazy_static! {
    static ref CASE_LINE: Regex =
        Regex::new(r"^(\S+)\s+\(([^)]+)\)\s+\.\.\.\s+(ok|FAIL|ERROR)$").unwrap();
}

/// Parses the diagnostic stream line-by-line. Entries sharing an identity
/// are deduplicated keeping the first occurrence: repeated in-process runs
/// under the same namespace can make the runner emit a case twice.
pub fn parse_cases(diagnostic_output: &str) -> Vec<ParsedCaseResult> {
    let mut cases: Vec<ParsedCaseResult> = Vec::new();

    for line in diagnostic_output.lines() {
        let Some(captures) = CASE_LINE.captures(line) else {
            continue;
        };

        let case_name = &captures[1];
        let group_name = bare_group_name(&captures[2], case_name);
        let identity = TestCaseIdentity {
            group_name,
            case_name: case_name.to_string(),
        };

        if cases.iter().any(|c| c.identity == identity) {
            continue;
        }

        let outcome = match &captures[3] {
            "ok" => CaseOutcome::Ok,
            "FAIL" => CaseOutcome::Fail,
            _ => CaseOutcome::Error,
        };

        cases.push(ParsedCaseResult { identity, outcome });
    }

    cases
}

/// Recovers the bare group name from the runner's qualified form, dropping
/// the main-module marker and a duplicated case-name path segment.
fn bare_group_name(qualified: &str, case_name: &str) -> String {
    let parts: Vec<&str> = qualified.split('.').collect();
    if parts.len() < 2 {
        return qualified.to_string();
    }

    let filtered: Vec<&str> = parts
        .iter()
        .copied()
        .filter(|p| *p != "__main__" && *p != case_name)
        .collect();

    if !filtered.is_empty() {
        filtered.join(".")
    } else {
        parts[parts.len() - 2].to_string()
    }
}

/// Best-effort correlation between a parsed case and the runner's free-text
/// failure/error labels. The runner does not expose a structured mapping
/// between the two artifacts, so this is a substring join: failures are
/// searched before errors, first match wins.
pub fn find_detail<'a>(
    identity: &TestCaseIdentity,
    failure_details: &'a [CaseDetail],
    error_details: &'a [CaseDetail],
) -> Option<&'a CaseDetail> {
    failure_details
        .iter()
        .chain(error_details.iter())
        .find(|detail| detail_matches(identity, detail))
}

fn detail_matches(identity: &TestCaseIdentity, detail: &CaseDetail) -> bool {
    if detail.case.is_empty() {
        return false;
    }
    if detail.case.contains(&identity.case_name) {
        return true;
    }
    // The label usually leads with the case name, e.g.
    // "test_world (__main__.TestGreet.test_world)".
    detail
        .case
        .split_whitespace()
        .next()
        .is_some_and(|label_head| identity.qualified().contains(label_head))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn identity(group: &str, case: &str) -> TestCaseIdentity {
        TestCaseIdentity {
            group_name: group.to_string(),
            case_name: case.to_string(),
        }
    }

    #[test]
    fn parses_the_three_outcomes() {
        let output = "\
test_basic_name (__main__.TestGreet.test_basic_name) ... ok
test_world (__main__.TestGreet.test_world) ... FAIL
test_missing (__main__.TestGreet.test_missing) ... ERROR

======================================================================
FAIL: test_world (__main__.TestGreet.test_world)
----------------------------------------------------------------------
";
        let cases = parse_cases(output);
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].identity, identity("TestGreet", "test_basic_name"));
        assert_eq!(cases[0].outcome, CaseOutcome::Ok);
        assert_eq!(cases[1].outcome, CaseOutcome::Fail);
        assert_eq!(cases[2].outcome, CaseOutcome::Error);
    }

    #[test]
    fn strips_module_marker_without_trailing_case_segment() {
        // Older runtimes qualify as module.Group only.
        let cases = parse_cases("test_push (__main__.TestStack) ... ok\n");
        assert_eq!(cases[0].identity, identity("TestStack", "test_push"));
    }

    #[test]
    fn keeps_dotted_group_names_intact() {
        let cases = parse_cases("test_a (__main__.Outer.TestInner.test_a) ... ok\n");
        assert_eq!(cases[0].identity.group_name, "Outer.TestInner");
    }

    #[test]
    fn falls_back_when_filtering_empties_the_path() {
        // Degenerate shape where every segment is marker or case name.
        let cases = parse_cases("test_a (__main__.test_a) ... ok\n");
        assert_eq!(cases[0].identity.group_name, "__main__");
    }

    #[test]
    fn duplicate_identities_keep_the_first_occurrence() {
        let output = "\
test_world (__main__.TestGreet.test_world) ... ok
test_world (__main__.TestGreet.test_world) ... FAIL
";
        let cases = parse_cases(output);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].outcome, CaseOutcome::Ok);
    }

    #[test]
    fn ignores_summary_and_separator_lines() {
        let output = "\
----------------------------------------------------------------------
Ran 2 tests in 0.003s

OK
";
        assert!(parse_cases(output).is_empty());
    }

    #[test]
    fn detail_lookup_matches_on_case_name_substring() {
        let failures = vec![CaseDetail {
            case: "test_world (__main__.TestGreet.test_world)".to_string(),
            message: "AssertionError: 'World' != 'Hello, World!'".to_string(),
        }];
        let found = find_detail(&identity("TestGreet", "test_world"), &failures, &[]);
        assert!(found.is_some());
        assert!(found.unwrap().message.contains("AssertionError"));

        let missing = find_detail(&identity("TestGreet", "test_basic_name"), &failures, &[]);
        assert!(missing.is_none());
    }

    #[test]
    fn detail_lookup_falls_back_to_label_head_containment() {
        // No case-name substring anywhere; only the label head is usable.
        let errors = vec![CaseDetail {
            case: "TestGreet (setup failed)".to_string(),
            message: "NameError: name 'greet' is not defined".to_string(),
        }];
        let found = find_detail(&identity("TestGreet", "test_world"), &[], &errors);
        assert!(found.is_some());
    }
}
