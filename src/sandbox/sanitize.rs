//! Prepares uploaded sources for execution in the shared namespace.
//!
//! Problem suites are often written for a file-based runner: they import the
//! solution as a module, guard a `unittest.main()` call behind
//! `if __name__ == "__main__":`, and so on. None of that applies here, since
//! user code is injected straight into the same globals the tests run in, so
//! those lines are stripped before compilation. Standard-library imports are
//! left untouched.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SOLUTION_IMPORT: Regex =
        Regex::new(r"^(from\s+solution\s+import\b|import\s+solution\b)").unwrap();
    // Bare imports of capitalized names refer to user-defined classes, not
    // real modules (e.g. `import VirtualFileSystem`); the class already
    // lives in the globals once user code has executed.
    static ref USER_CLASS_IMPORT: Regex =
        Regex::new(r"^(import\s+[A-Z]\w*\s*$|from\s+[A-Z]\w*\s+import\b)").unwrap();
    static ref MAIN_GUARD: Regex =
        Regex::new(r#"^if\s+__name__\s*==\s*['"]__main__['"]\s*:"#).unwrap();
    static ref UNITTEST_MAIN: Regex = Regex::new(r"^unittest\.main\s*\(").unwrap();
}

/// Strips runner-specific scaffolding from a source, preserving everything
/// else line-for-line.
pub fn clean_source(source: &str) -> String {
    let mut result: Vec<&str> = Vec::new();
    let mut skipping_main_guard = false;

    for line in source.lines() {
        let trimmed = line.trim();

        if skipping_main_guard {
            // Still inside the guard body: blank or indented lines belong
            // to the block.
            if trimmed.is_empty() || line.starts_with(char::is_whitespace) {
                continue;
            }
            skipping_main_guard = false;
        }

        if SOLUTION_IMPORT.is_match(trimmed) || USER_CLASS_IMPORT.is_match(trimmed) {
            continue;
        }

        if MAIN_GUARD.is_match(trimmed) {
            skipping_main_guard = true;
            continue;
        }

        if UNITTEST_MAIN.is_match(trimmed) {
            continue;
        }

        result.push(line);
    }

    result.join("\n")
}
