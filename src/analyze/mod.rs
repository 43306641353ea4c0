use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::{Analysis, Outcome, PlanEntry, QaError, ResultRecord};

const PASS_MARKER: &str = "PASS";
const FAIL_MARKER: &str = "FAIL";
const SYS_MARKER: &str = "SYS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Result(Outcome),
    System,
}

pub fn classify_line(line: &str) -> Option<LineClass> {
    if line.contains(PASS_MARKER) {
        Some(LineClass::Result(Outcome::Pass))
    } else if line.contains(FAIL_MARKER) {
        Some(LineClass::Result(Outcome::Fail))
    } else if line.contains(SYS_MARKER) {
        Some(LineClass::System)
    } else {
        None
    }
}

pub fn analyze_lines<R: BufRead>(mut reader: R, plan: &[PlanEntry]) -> Result<Analysis> {
    let mut results: Vec<(Outcome, String)> = Vec::new();
    let mut system_info = Vec::new();

    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .context("failed to read report")?;
        if n == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        match classify_line(line) {
            Some(LineClass::Result(outcome)) => results.push((outcome, line.to_string())),
            Some(LineClass::System) => system_info.push(line.to_string()),
            None => {}
        }
    }

    if results.len() < plan.len() {
        return Err(QaError::IncompleteTest {
            expected: plan.len(),
            found: results.len(),
            archived: None,
        }
        .into());
    }

    let records = plan
        .iter()
        .zip(results)
        .enumerate()
        .map(|(ordinal, (entry, (outcome, line)))| {
            ResultRecord::new(ordinal, entry, outcome, line)
        })
        .collect();

    Ok(Analysis {
        records,
        system_info,
    })
}

pub fn analyze_report(path: &Path, plan: &[PlanEntry]) -> Result<Analysis> {
    let file = File::open(path)
        .with_context(|| format!("failed to open report: {}", path.display()))?;
    log::debug!("analyzing {}", path.display());
    analyze_lines(BufReader::new(file), plan)
}
