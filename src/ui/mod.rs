use anyhow::Error;
use std::io::{self, Write};
use std::path::Path;
use unicode_width::UnicodeWidthChar;

use crate::core::{Analysis, Outcome, QaError, ResultRecord, Verdict};

const TITLE_WIDTH: usize = 26;
const RESULT_WIDTH: usize = 10;
const COMMENTS_WIDTH: usize = 15;

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub color: bool,
    pub quiet: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Header,
    Blue,
    Pass,
    Warning,
    Fail,
    Bold,
    Underline,
}

impl Style {
    const fn sgr(self) -> &'static str {
        match self {
            Style::Header => "95",
            Style::Blue => "94",
            Style::Pass => "92",
            Style::Warning => "93",
            Style::Fail => "91",
            Style::Bold => "1",
            Style::Underline => "4",
        }
    }
}

pub fn paint(s: &str, styles: &[Style], color: bool) -> String {
    if !color || styles.is_empty() {
        return s.to_string();
    }
    let codes: Vec<&str> = styles.iter().map(|st| st.sgr()).collect();
    format!("\x1b[{}m{s}\x1b[0m", codes.join(";"))
}

pub fn system_payload(line: &str) -> &str {
    match line.split_once("- ") {
        Some((_, payload)) => payload,
        None => line,
    }
}

pub fn eprintln_error(err: &Error, home_dir: Option<&Path>) {
    let color = {
        use std::io::IsTerminal;
        io::stderr().is_terminal()
    };
    let mut stderr = io::stderr().lock();

    if let Some(qa) = err.downcast_ref::<QaError>() {
        let _ = write_qa_error(&mut stderr, qa, home_dir, color);
        return;
    }

    let _ = writeln!(stderr, "{}", paint("error:", &[Style::Fail, Style::Bold], color));
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(stderr, "  - rerun with `--verbose` for more detail");
    let _ = writeln!(stderr, "  - see `bcmqa --help` for the available options");
}

fn write_qa_error(
    out: &mut dyn Write,
    err: &QaError,
    home_dir: Option<&Path>,
    color: bool,
) -> io::Result<()> {
    match err {
        QaError::ConfigMissing { path } => {
            let cmd = match home_dir {
                Some(home) => crate::identity::remediation_command(path, home),
                None => format!("echo YOUR_ROC_USERNAME >{}", path.display()),
            };
            writeln!(
                out,
                "{}",
                paint("USERNAME NOT FOUND.", &[Style::Warning, Style::Bold], color)
            )?;
            writeln!(out, "Please set username by")?;
            writeln!(out)?;
            writeln!(out, "{}", paint(&cmd, &[Style::Bold], color))?;
            writeln!(out)?;
            writeln!(out, "Then run this again.")
        }
        QaError::ConnectivityFailure { .. } => {
            writeln!(out, "{}", paint(&err.to_string(), &[Style::Bold], color))
        }
        QaError::IncompleteTest { archived, .. } => {
            writeln!(out, "{}", paint(&err.to_string(), &[Style::Bold], color))?;
            if let Some(path) = archived {
                writeln!(out, "Raw report kept at {}", path.display())?;
            }
            Ok(())
        }
    }
}

pub fn render(
    out: &mut dyn Write,
    analysis: &Analysis,
    test_exit_code: i32,
    cfg: &UiConfig,
) -> io::Result<()> {
    let color = cfg.color;

    if cfg.quiet {
        return writeln!(out, "{}", paint("Test completed.", &[Style::Blue], color));
    }

    writeln!(
        out,
        "{}",
        paint("SUMMARY", &[Style::Bold, Style::Underline, Style::Header], color)
    )?;
    writeln!(out)?;

    if cfg.verbose {
        write_results_table(out, &analysis.records, true, color)?;
    } else {
        match Verdict::from_exit_code(test_exit_code) {
            Verdict::Failed => {
                writeln!(
                    out,
                    "{}",
                    paint("TEST FAILED", &[Style::Fail, Style::Bold], color)
                )?;
                writeln!(out)?;
                write_results_table(out, &analysis.records, false, color)?;
            }
            Verdict::Passed => {
                writeln!(
                    out,
                    "{}",
                    paint("TEST PASSED", &[Style::Pass, Style::Bold], color)
                )?;
            }
        }
    }

    write_system_info(out, &analysis.system_info, color)?;
    writeln!(out)
}

pub fn print_summary(analysis: &Analysis, test_exit_code: i32, cfg: &UiConfig) {
    let mut out = io::stdout().lock();
    let _ = render(&mut out, analysis, test_exit_code, cfg);
}

fn write_results_table(
    out: &mut dyn Write,
    records: &[ResultRecord],
    include_passes: bool,
    color: bool,
) -> io::Result<()> {
    let head = format!(
        "{} {} {}",
        pad_end_ansi("TITLE", TITLE_WIDTH),
        pad_end_ansi("RESULT", RESULT_WIDTH),
        pad_end_ansi("COMMENTS", COMMENTS_WIDTH)
    );
    writeln!(out, "{}", paint(&head, &[Style::Bold, Style::Underline], color))?;

    for record in records {
        let title = pad_end_ansi(&record.title, TITLE_WIDTH);
        match record.outcome {
            Outcome::Pass => {
                if include_passes {
                    let result = paint(&record.line, &[Style::Pass], color);
                    writeln!(out, "{title} {}", pad_end_ansi(&result, RESULT_WIDTH))?;
                }
            }
            Outcome::Fail => {
                let result = paint(&record.line, &[Style::Fail], color);
                let note = record.note.as_deref().unwrap_or("");
                writeln!(
                    out,
                    "{title} {} {}",
                    pad_end_ansi(&result, RESULT_WIDTH),
                    pad_end_ansi(note, COMMENTS_WIDTH)
                )?;
            }
        }
    }
    Ok(())
}

fn write_system_info(out: &mut dyn Write, system_info: &[String], color: bool) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        paint("SYSTEM INFORMATION", &[Style::Bold, Style::Underline], color)
    )?;
    for line in system_info {
        writeln!(out, "-> {}", system_payload(line))?;
    }
    Ok(())
}

fn pad_end_ansi(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}

fn visible_width_ansi(s: &str) -> usize {
    let mut width: usize = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            let _ = chars.next();
            for ch2 in chars.by_ref() {
                if ch2 == 'm' {
                    break;
                }
            }
            continue;
        }
        width = width.saturating_add(UnicodeWidthChar::width(ch).unwrap_or(0));
    }
    width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlanEntry;

    fn cfg(quiet: bool, verbose: bool) -> UiConfig {
        UiConfig {
            color: false,
            quiet,
            verbose,
        }
    }

    fn sample() -> Analysis {
        let a = PlanEntry::new("HOME DIR. CONTENTS", "FILES PRESENT");
        let b = PlanEntry::new("MACHINE TYPE", "TYPE MISMATCH");
        Analysis {
            records: vec![
                ResultRecord::new(0, &a, Outcome::Pass, "PASS"),
                ResultRecord::new(1, &b, Outcome::Fail, "FAIL"),
            ],
            system_info: vec![
                "SYS - CPU: model X".to_string(),
                "SYS - Memory - 16GB".to_string(),
            ],
        }
    }

    fn rendered(analysis: &Analysis, exit_code: i32, cfg: &UiConfig) -> String {
        let mut buf = Vec::new();
        render(&mut buf, analysis, exit_code, cfg).expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn quiet_prints_only_acknowledgement() {
        let out = rendered(&sample(), 1, &cfg(true, false));
        assert_eq!(out, "Test completed.\n");
    }

    #[test]
    fn verbose_prints_passes_and_failures_with_notes() {
        let out = rendered(&sample(), 0, &cfg(false, true));
        assert!(out.contains("HOME DIR. CONTENTS         PASS"), "out={out}");
        assert!(
            out.contains("MACHINE TYPE               FAIL       TYPE MISMATCH"),
            "out={out}"
        );
        assert!(!out.contains("TEST PASSED"));
    }

    #[test]
    fn default_failure_shows_banner_and_failures_only() {
        let out = rendered(&sample(), 1, &cfg(false, false));
        assert!(out.contains("TEST FAILED"));
        assert!(out.contains("TITLE"));
        assert!(out.contains("TYPE MISMATCH"));
        assert!(!out.contains("HOME DIR. CONTENTS"));
    }

    #[test]
    fn default_pass_shows_banner_without_table() {
        let out = rendered(&sample(), 0, &cfg(false, false));
        assert!(out.contains("TEST PASSED"));
        assert!(!out.contains("TITLE"));
        assert!(!out.contains("MACHINE TYPE"));
    }

    #[test]
    fn system_info_is_reduced_after_first_separator() {
        let out = rendered(&sample(), 0, &cfg(false, false));
        assert!(out.contains("SYSTEM INFORMATION\n-> CPU: model X\n-> Memory - 16GB\n"));
        assert_eq!(system_payload("SYS - CPU: model X"), "CPU: model X");
        assert_eq!(system_payload("SYS no separator"), "SYS no separator");
    }

    #[test]
    fn paint_is_plain_without_color() {
        assert_eq!(paint("TEST PASSED", &[Style::Pass, Style::Bold], false), "TEST PASSED");
        assert_eq!(
            paint("TEST PASSED", &[Style::Pass, Style::Bold], true),
            "\x1b[92;1mTEST PASSED\x1b[0m"
        );
    }

    #[test]
    fn padding_ignores_escape_sequences() {
        let s = paint("FAIL", &[Style::Fail], true);
        assert_eq!(visible_width_ansi(&s), 4);
        assert_eq!(visible_width_ansi(&pad_end_ansi(&s, RESULT_WIDTH)), RESULT_WIDTH);
    }

    #[test]
    fn config_missing_message_carries_remediation() {
        let mut buf = Vec::new();
        let home = Path::new("/home/op");
        let err = QaError::ConfigMissing {
            path: home.join(".bin/username"),
        };
        write_qa_error(&mut buf, &err, Some(home), false).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("USERNAME NOT FOUND."));
        assert!(text.contains("echo YOUR_ROC_USERNAME >~/.bin/username"));
    }
}
