//! Output functions for consistent CLI formatting
//!
//! The report itself is written to any `Write` sink; preamble lines go to stderr.

use crate::rules::{Finding, Mark};
use console::style;
use std::io::{self, Write};

/// Width of the rule drawn around section titles
const RULE_WIDTH: usize = 78;

/// Renders finding marks, styled or plain
#[derive(Debug, Clone, Copy)]
pub struct Marks {
    color: bool,
}

impl Marks {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Glyph for a mark
    pub fn symbol(mark: Mark) -> &'static str {
        match mark {
            Mark::Pass => "✓",
            Mark::Warn => "●",
            Mark::Fail => "X",
        }
    }

    /// Mark glyph, colored when enabled
    pub fn mark(&self, mark: Mark) -> String {
        let glyph = Self::symbol(mark);
        if !self.color {
            return glyph.to_string();
        }
        match mark {
            Mark::Pass => style(glyph).green().to_string(),
            Mark::Warn => style(glyph).yellow().to_string(),
            Mark::Fail => style(glyph).red().to_string(),
        }
    }

    /// A finding as `<mark> <message>`
    pub fn render(&self, finding: &Finding) -> String {
        format!("{} {}", self.mark(finding.mark), finding.message)
    }
}

/// Display an info step on stderr
pub fn step_info(message: &str) {
    eprintln!("{} {}", style("[INFO]").cyan(), message);
}

/// Display a warning step on stderr
pub fn step_warn(message: &str) {
    eprintln!("{} {}", style("[WARN]").yellow(), message);
}

/// Report title line
pub fn title(out: &mut impl Write, name: &str) -> io::Result<()> {
    writeln!(out, "Report on {}", name)?;
    writeln!(out)
}

/// Display a section header between two rules
pub fn section(out: &mut impl Write, title: &str) -> io::Result<()> {
    let rule = "-".repeat(RULE_WIDTH);
    writeln!(out, "{}", rule)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", rule)?;
    writeln!(out)
}

/// One dependency's findings, followed by a blank line
pub fn analysis(
    out: &mut impl Write,
    marks: &Marks,
    name: &str,
    findings: &[Finding],
) -> io::Result<()> {
    writeln!(out, "Analysis of {}:", name)?;
    for finding in findings {
        writeln!(out, "{}", marks.render(finding))?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn plain_marks() {
        let marks = Marks::new(false);
        assert_eq!(marks.render(&Finding::pass("ok")), "✓ ok");
        assert_eq!(marks.render(&Finding::warn("hmm")), "● hmm");
        assert_eq!(marks.render(&Finding::fail("bad")), "X bad");
    }

    #[test]
    fn colored_marks_keep_glyph() {
        let marks = Marks::new(true);
        assert!(console::strip_ansi_codes(&marks.mark(Mark::Fail)) == "X");
    }

    #[test]
    fn section_layout() {
        let mut buf = Vec::new();
        section(&mut buf, "Direct Imports").unwrap();
        let rule = "-".repeat(78);
        assert_eq!(text(buf), format!("{rule}\nDirect Imports\n{rule}\n\n"));
    }

    #[test]
    fn analysis_block() {
        let mut buf = Vec::new();
        let findings = vec![
            Finding::pass("Dependency provides Semantic Version releases"),
            Finding::warn("Not using latest Major Semantic Version"),
        ];
        analysis(&mut buf, &Marks::new(false), "github.com/foo/bar", &findings).unwrap();
        assert_eq!(
            text(buf),
            "Analysis of github.com/foo/bar:\n\
             ✓ Dependency provides Semantic Version releases\n\
             ● Not using latest Major Semantic Version\n\n"
        );
    }

    #[test]
    fn stderr_steps_do_not_panic() {
        step_info("Reading glide.yaml");
        step_warn("Disclaimer");
    }
}
