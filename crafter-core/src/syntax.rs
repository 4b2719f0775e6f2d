//! Indentation sanity check run before a submission leaves the machine.
//!
//! This is a heuristic, not a parser. It catches code whose indentation jumps more
//! than one level deeper than any open block allows, which is the most common shape
//! of a broken paste. It will miss plenty of real syntax errors and may accept odd
//! but valid formatting.

use std::fmt;

/// Columns per indentation level.
pub const TAB_WIDTH: usize = 4;

/// Trailing marker that opens a new block.
pub const BLOCK_OPENER: char = ':';

/// The first indentation anomaly found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentIssue {
    /// 1-based line number.
    pub line: usize,
    pub expected_level: usize,
    pub found_level: usize,
}

impl fmt::Display for IndentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Indentation error at line {}: expected at most {} level(s), found {}",
            self.line,
            self.expected_level + 1,
            self.found_level
        )
    }
}

/// Scans `text` and returns the first indentation anomaly, if any.
///
/// Blank lines are skipped. A line ending in [`BLOCK_OPENER`] raises the expected
/// level by one without checking its own indent. A shallower line is a dedent and
/// lowers the expected level to match. A line more than one level deeper than
/// expected is reported.
pub fn check_indentation(text: &str) -> Option<IndentIssue> {
    let mut expected = 0usize;

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let leading = line.chars().take_while(|c| c.is_whitespace()).count();
        let level = leading / TAB_WIDTH;

        if trimmed.ends_with(BLOCK_OPENER) {
            expected += 1;
        } else if level < expected {
            expected = level;
        } else if level > expected + 1 {
            return Some(IndentIssue {
                line: idx + 1,
                expected_level: expected,
                found_level: level,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_blocks() {
        let code = "import pygame\n\ndef main():\n    if True:\n        run()\n    done()\nmain()\n";
        assert_eq!(check_indentation(code), None);
    }

    #[test]
    fn reports_jump_of_two_levels() {
        let code = "x = 1\n        y = 2\n";
        let issue = check_indentation(code).unwrap();
        assert_eq!(issue.line, 2);
        assert_eq!(issue.found_level, 2);
        assert!(issue.to_string().contains("line 2"));
    }

    #[test]
    fn one_extra_level_is_tolerated() {
        assert_eq!(check_indentation("x = (\n    1)\n"), None);
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(check_indentation("def f():\n\n   \n    return 1\n"), None);
    }

    #[test]
    fn dedent_resets_expected_level() {
        // After dedenting to level 0 the next line may only go one level deeper.
        let code = "def f():\n    if x:\n        a()\nb()\n        c()\n";
        let issue = check_indentation(code).unwrap();
        assert_eq!(issue.line, 5);
        assert_eq!(issue.expected_level, 0);
    }

    #[test]
    fn empty_text_has_no_issue() {
        assert_eq!(check_indentation(""), None);
    }
}
