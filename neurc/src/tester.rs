use crate::init_subscriber;
use crate::lir::Function;
use std::cmp::max;
use std::panic::Location;
use tracing::info;

pub struct Tester;

impl Tester {
    /// Log at info level while testing.
    ///
    /// Only the first call installs a subscriber since the tests share one
    /// process.
    pub fn init_tracing() {
        init_subscriber(tracing::Level::INFO).ok();
    }
    /// `expected` with the line at `missing` marked.
    fn mark_missing(expected: &str, missing: usize) -> String {
        let marked = expected
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == missing {
                    format!("{line}   <== missing")
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("Output lacks a line:\n```\n{marked}\n```")
    }
    /// Compare line by line, ignoring leading and trailing whitespace of each line.
    pub fn check_lines_exact(actual: &str, expected: &str, caller: &Location<'_>) {
        let actual = actual.trim().lines().collect::<Vec<_>>();
        let expected = expected.trim().lines().collect::<Vec<_>>();
        for i in 0..max(actual.len(), expected.len()) {
            let Some(actual_line) = actual.get(i) else {
                panic!("Expected line {i} not found in output: called from {caller}");
            };
            let Some(expected_line) = expected.get(i) else {
                panic!("Unexpected line {i} in output: called from {caller}");
            };
            assert_eq!(
                actual_line.trim(),
                expected_line.trim(),
                "called from {caller}"
            );
        }
    }
    /// Find the lines of `expected`, in order, as substrings of lines of `actual`.
    ///
    /// Lines of `actual` in between are skipped, blank expected lines are ignored.
    pub fn check_lines_contain(actual: &str, expected: &str, caller: &Location<'_>) {
        let expected = expected.trim();
        let mut remaining = actual.trim().lines();
        for (i, wanted) in expected.lines().map(str::trim).enumerate() {
            if wanted.is_empty() {
                continue;
            }
            if !remaining.any(|line| line.contains(wanted)) {
                let msg = Self::mark_missing(expected, i);
                panic!("{msg}\nwhen called from {caller}");
            }
        }
    }
    /// Log `text` under a heading.
    pub fn print_heading(heading: &str, text: &str) {
        info!("{heading}:\n{text}");
    }
    /// Run the checks on a lowered function that are not visible in its
    /// textual form.
    ///
    /// Panics when an assignment is ill typed or a variable is read before
    /// it is defined.
    pub fn verify(function: &Function) {
        if let Err(err) = function.check_types() {
            panic!("ill typed function: {err}\n{function}");
        }
        if let Err(err) = function.verify_definitions() {
            panic!("{err}\n{function}");
        }
    }
}
