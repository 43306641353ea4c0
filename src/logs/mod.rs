use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::{Analysis, QaError, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Started,
    Passed,
    Failed,
    Unreachable,
    Incomplete,
    Error,
}

#[derive(Debug, Clone)]
pub struct RunLog {
    pub rin: String,
    pub bundle: String,
    pub date_stamp: String,
    pub started_at: OffsetDateTime,
    pub status: RunStatus,
    pub probe_exit_code: Option<i32>,
    pub test_exit_code: Option<i32>,
    pub pass_count: Option<usize>,
    pub fail_count: Option<usize>,
    pub system_info_count: Option<usize>,
    pub archived_report: Option<PathBuf>,
    pub error: Option<String>,
}

impl RunLog {
    pub fn new(rin: &str, bundle: &str, date_stamp: &str) -> Self {
        Self {
            rin: rin.to_string(),
            bundle: bundle.to_string(),
            date_stamp: date_stamp.to_string(),
            started_at: OffsetDateTime::now_utc(),
            status: RunStatus::Started,
            probe_exit_code: None,
            test_exit_code: None,
            pass_count: None,
            fail_count: None,
            system_info_count: None,
            archived_report: None,
            error: None,
        }
    }

    pub fn record_analysis(&mut self, analysis: &Analysis) {
        self.pass_count = Some(analysis.pass_count());
        self.fail_count = Some(analysis.fail_count());
        self.system_info_count = Some(analysis.system_info.len());
    }

    pub fn finish<T>(&mut self, result: &Result<T>) {
        match result {
            Ok(_) => {
                self.status = match self.test_exit_code.map(Verdict::from_exit_code) {
                    Some(Verdict::Passed) => RunStatus::Passed,
                    _ => RunStatus::Failed,
                };
            }
            Err(err) => {
                self.status = match err.downcast_ref::<QaError>() {
                    Some(QaError::ConnectivityFailure { .. }) => RunStatus::Unreachable,
                    Some(QaError::IncompleteTest { archived, .. }) => {
                        if self.archived_report.is_none() {
                            self.archived_report = archived.clone();
                        }
                        RunStatus::Incomplete
                    }
                    _ => RunStatus::Error,
                };
                self.error = Some(format!("{err:#}"));
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct RunLogFile<'a> {
    schema_version: &'static str,
    tool_version: String,
    command: &'static str,
    started_at: String,
    finished_at: String,
    rin: &'a str,
    bundle: &'a str,
    date_stamp: &'a str,
    status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    probe_exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pass_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fail_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_info_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archived_report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

pub fn logs_dir(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/bcmqa/logs")
}

pub fn write_run_log(
    home_dir: &Path,
    run: &RunLog,
    finished_at: OffsetDateTime,
) -> Result<PathBuf> {
    let dir = logs_dir(home_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let pid = std::process::id();
    let ts = finished_at.unix_timestamp_nanos();
    let path = dir.join(format!("run-{pid}-{ts}.json"));

    let log = RunLogFile {
        schema_version: "1.0",
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        command: "run",
        started_at: run
            .started_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string()),
        finished_at: finished_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string()),
        rin: &run.rin,
        bundle: &run.bundle,
        date_stamp: &run.date_stamp,
        status: run.status,
        probe_exit_code: run.probe_exit_code,
        test_exit_code: run.test_exit_code,
        pass_count: run.pass_count,
        fail_count: run.fail_count,
        system_info_count: run.system_info_count,
        archived_report: run
            .archived_report
            .as_deref()
            .map(|p| mask_home(p, home_dir)),
        error: run.error.as_deref(),
    };

    let json = serde_json::to_vec_pretty(&log).context("failed to serialize run log")?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write run log: {}", path.display()))?;

    Ok(path)
}

fn mask_home(path: &Path, home_dir: &Path) -> String {
    match path.strip_prefix(home_dir) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}
