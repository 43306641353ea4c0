use serde::Serialize;
use std::fmt;

use crate::core::PlanEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub ordinal: usize,
    pub title: String,
    pub outcome: Outcome,
    pub line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ResultRecord {
    pub fn new(
        ordinal: usize,
        entry: &PlanEntry,
        outcome: Outcome,
        line: impl Into<String>,
    ) -> Self {
        let note = match outcome {
            Outcome::Pass => None,
            Outcome::Fail => Some(entry.note.to_string()),
        };
        Self {
            ordinal,
            title: entry.title.to_string(),
            outcome,
            line: line.into(),
            note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Analysis {
    pub records: Vec<ResultRecord>,
    pub system_info: Vec<String>,
}

impl Analysis {
    pub fn pass_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Pass)
            .count()
    }

    pub fn fail_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Fail)
            .count()
    }
}

/// Overall verdict from the test procedure's exit code. Every nonzero code is a failure, not
/// only 1, so a procedure killed by a signal (-1) or crashing with another code never reads
/// as passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
}

impl Verdict {
    pub const fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Verdict::Passed
        } else {
            Verdict::Failed
        }
    }
}
