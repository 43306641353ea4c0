use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::config::{self, EffectiveConfig};
use crate::core::{Analysis, ResultRecord, TEST_PLAN, Verdict};
use crate::engine::{Engine, EngineOptions, RunOutcome, RunRequest};
use crate::logs::RunLog;
use crate::ui::{self, UiConfig};

#[derive(Debug, Parser)]
#[command(
    name = "bcmqa",
    version,
    about = "Run the QA test on a newly provisioned BCM replacement"
)]
pub struct Cli {
    /// RIN of the device under test
    #[arg(short = 'r', long, value_name = "RIN", required_unless_present = "show_config")]
    pub rin: Option<String>,
    /// Bundle ID of the route/config package in use
    #[arg(
        short = 'b',
        long,
        value_name = "BUNDLE",
        required_unless_present = "show_config"
    )]
    pub bundle: Option<String>,
    /// Run the test without printing a result
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
    /// Print pass / fail details of each sub-test
    #[arg(short, long)]
    pub verbose: bool,
    /// Print the results as JSON
    #[arg(long, conflicts_with_all = ["quiet", "verbose"])]
    pub json: bool,
    #[arg(long = "no-color")]
    pub no_color: bool,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Seconds to wait for each external script (0 waits forever)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// Report date as YYYYMMDD (defaults to today)
    #[arg(long, value_name = "YYYYMMDD", value_parser = parse_date_stamp_arg)]
    pub date_stamp: Option<String>,
    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,
}

fn parse_date_stamp_arg(s: &str) -> std::result::Result<String, String> {
    crate::report::parse_date_stamp(s).map_err(|e| format!("{e:#}"))
}

#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    rin: &'a str,
    bundle: &'a str,
    date_stamp: &'a str,
    verdict: Verdict,
    test_exit_code: i32,
    archived_report: String,
    results: &'a [ResultRecord],
    system_info: Vec<&'a str>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let home_dir = crate::platform::effective_home_dir()?;

    let env_config_path = std::env::var_os("BCMQA_CONFIG").map(PathBuf::from);
    let cfg = config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        &home_dir,
    )
    .map_err(crate::exit::invalid_args_err)?;

    if cli.show_config {
        return write_json(&cfg);
    }

    let rin = required_value(cli.rin.as_deref(), "--rin")?;
    let bundle = required_value(cli.bundle.as_deref(), "--bundle")?;

    let ui_cfg = UiConfig {
        color: io::stdout().is_terminal() && cfg.ui.color && !cli.no_color,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    let date_stamp = cli
        .date_stamp
        .clone()
        .unwrap_or_else(crate::report::today_stamp);
    let timeout_secs = cli.timeout.unwrap_or(cfg.run.timeout_secs);
    let work_dir = std::env::current_dir().context("failed to read the working directory")?;

    let engine = Engine::new(
        engine_options(
            &cfg,
            &home_dir,
            work_dir,
            timeout_secs,
            show_progress(io::stderr().is_terminal(), &cli),
            cli.json,
        ),
        TEST_PLAN,
    );

    let request = RunRequest {
        rin: rin.clone(),
        bundle: bundle.clone(),
        date_stamp: date_stamp.clone(),
    };
    let mut run_log = RunLog::new(&rin, &bundle, &date_stamp);
    let result = engine.run(&request, &mut run_log);

    run_log.finish(&result);
    match crate::logs::write_run_log(&home_dir, &run_log, time::OffsetDateTime::now_utc()) {
        Ok(path) => log::debug!("run log written to {}", path.display()),
        Err(err) => log::warn!("failed to write run log: {err:#}"),
    }

    let outcome = result?;

    if cli.json {
        write_json(&json_summary(&request, &outcome))?;
    } else {
        ui::print_summary(&outcome.analysis, outcome.test_exit_code, &ui_cfg);
    }

    Ok(())
}

fn engine_options(
    cfg: &EffectiveConfig,
    home_dir: &Path,
    work_dir: PathBuf,
    timeout_secs: u64,
    show_progress: bool,
    probe_to_stderr: bool,
) -> EngineOptions {
    EngineOptions {
        identity_file: config::expand_tilde(&cfg.identity.file, home_dir),
        status_script: config::resolve_script(&cfg.paths.status_script, home_dir, &work_dir),
        test_script: config::resolve_script(&cfg.paths.test_script, home_dir, &work_dir),
        archive_dir: config::expand_tilde(&cfg.paths.archive_dir, home_dir),
        work_dir,
        timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        show_progress,
        probe_to_stderr,
    }
}

fn show_progress(stderr_is_tty: bool, cli: &Cli) -> bool {
    stderr_is_tty && !cli.quiet && !cli.json
}

fn required_value(v: Option<&str>, flag: &str) -> Result<String> {
    let v = v.map(str::trim).unwrap_or("");
    if v.is_empty() {
        return Err(crate::exit::invalid_args(format!("{flag} must not be empty")));
    }
    Ok(v.to_string())
}

fn json_summary<'a>(req: &'a RunRequest, outcome: &'a RunOutcome) -> JsonSummary<'a> {
    let Analysis {
        records,
        system_info,
    } = &outcome.analysis;
    JsonSummary {
        rin: &req.rin,
        bundle: &req.bundle,
        date_stamp: &req.date_stamp,
        verdict: Verdict::from_exit_code(outcome.test_exit_code),
        test_exit_code: outcome.test_exit_code,
        archived_report: outcome.archived_report.display().to_string(),
        results: records,
        system_info: system_info.iter().map(|s| ui::system_payload(s)).collect(),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "bcmqa=info" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("failed to write JSON")?;
    writeln!(out).context("failed to write JSON")?;
    Ok(())
}
