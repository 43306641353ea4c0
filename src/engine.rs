use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::core::{Analysis, PlanEntry, QaError};
use crate::identity::Identity;
use crate::logs::RunLog;
use crate::{analyze, identity, platform, report};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub identity_file: PathBuf,
    pub status_script: PathBuf,
    pub test_script: PathBuf,
    pub archive_dir: PathBuf,
    pub work_dir: PathBuf,
    pub timeout: Option<Duration>,
    pub show_progress: bool,
    pub probe_to_stderr: bool,
}

#[derive(Clone)]
pub struct Engine {
    opts: EngineOptions,
    plan: &'static [PlanEntry],
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub rin: String,
    pub bundle: String,
    pub date_stamp: String,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub analysis: Analysis,
    pub test_exit_code: i32,
    pub archived_report: PathBuf,
}

impl Engine {
    pub fn new(opts: EngineOptions, plan: &'static [PlanEntry]) -> Self {
        Self { opts, plan }
    }

    pub fn report_path(&self, rin: &str, date_stamp: &str) -> PathBuf {
        self.opts
            .work_dir
            .join(report::report_file_name(rin, date_stamp))
    }

    pub fn resolve_identity(&self) -> Result<Identity> {
        identity::resolve_identity(&self.opts.identity_file)
    }

    pub fn probe(&self, identity: &Identity, rin: &str) -> Result<i32> {
        log::info!("probing {rin} via {}", self.opts.status_script.display());
        let args = [identity.as_str(), rin];
        if self.opts.probe_to_stderr {
            platform::run_passthrough(
                &self.opts.status_script,
                &args,
                self.opts.timeout,
                std::io::stderr(),
            )
        } else {
            platform::run_passthrough(
                &self.opts.status_script,
                &args,
                self.opts.timeout,
                std::io::stdout(),
            )
        }
    }

    pub fn run_test(
        &self,
        identity: &Identity,
        rin: &str,
        bundle: &str,
        date_stamp: &str,
    ) -> Result<i32> {
        let path = self.report_path(rin, date_stamp);
        let file = report::create_report(&path, identity)?;
        log::info!(
            "running {} for {rin} (bundle {bundle}) into {}",
            self.opts.test_script.display(),
            path.display()
        );

        let pb = if self.opts.show_progress {
            let pb = indicatif::ProgressBar::new_spinner();
            pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            pb.set_message(format!("Testing {rin}..."));
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let result = platform::run_redirected(
            &self.opts.test_script,
            &[identity.as_str(), rin, bundle],
            &file,
            self.opts.timeout,
        );
        drop(file);

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        result
    }

    pub fn analyze(&self, rin: &str, date_stamp: &str) -> Result<Analysis> {
        analyze::analyze_report(&self.report_path(rin, date_stamp), self.plan)
    }

    pub fn archive(&self, rin: &str, date_stamp: &str) -> Result<PathBuf> {
        report::archive_report(&self.report_path(rin, date_stamp), &self.opts.archive_dir)
    }

    pub fn run(&self, req: &RunRequest, run_log: &mut RunLog) -> Result<RunOutcome> {
        let identity = self.resolve_identity()?;

        let probe_exit_code = self.probe(&identity, &req.rin)?;
        run_log.probe_exit_code = Some(probe_exit_code);
        if probe_exit_code != 0 {
            return Err(QaError::ConnectivityFailure {
                rin: req.rin.clone(),
                exit_code: probe_exit_code,
            }
            .into());
        }

        let test_exit_code = self.run_test(&identity, &req.rin, &req.bundle, &req.date_stamp)?;
        run_log.test_exit_code = Some(test_exit_code);

        let analysis = match self.analyze(&req.rin, &req.date_stamp) {
            Ok(analysis) => analysis,
            Err(err) => return Err(self.keep_incomplete_report(err, req)),
        };
        run_log.record_analysis(&analysis);

        let archived_report = self.archive(&req.rin, &req.date_stamp)?;
        run_log.archived_report = Some(archived_report.clone());

        Ok(RunOutcome {
            analysis,
            test_exit_code,
            archived_report,
        })
    }

    // An incomplete report is still archived so the operator can see how far the test got.
    fn keep_incomplete_report(&self, err: anyhow::Error, req: &RunRequest) -> anyhow::Error {
        let (expected, found) = match err.downcast_ref::<QaError>() {
            Some(QaError::IncompleteTest {
                expected, found, ..
            }) => (*expected, *found),
            _ => return err,
        };

        match self.archive(&req.rin, &req.date_stamp) {
            Ok(archived) => QaError::IncompleteTest {
                expected,
                found,
                archived: Some(archived),
            }
            .into(),
            Err(archive_err) => {
                log::warn!("could not archive incomplete report: {archive_err:#}");
                err
            }
        }
    }
}
