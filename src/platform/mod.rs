use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use wait_timeout::ChildExt;

const PASSTHROUGH_DRAIN: Duration = Duration::from_secs(2);

/// Runs `cmd` with stdout and stderr merged into one pipe and copies every line to `sink`
/// as soon as it arrives. Returns the child's exit code.
pub fn run_passthrough<W>(
    cmd: &Path,
    args: &[&str],
    timeout: Option<Duration>,
    mut sink: W,
) -> Result<i32>
where
    W: Write + Send + 'static,
{
    let (reader, writer) = std::io::pipe().context("failed to create output pipe")?;
    // The command owns the parent's copies of the write end; dropping it before reading lets
    // the pipe reach EOF once the child exits.
    let mut child = {
        let stdout = writer.try_clone().context("failed to duplicate output pipe")?;
        let mut command = Command::new(cmd);
        command.args(args).stdout(stdout).stderr(writer);
        command
            .spawn()
            .with_context(|| format!("failed to start process: {}", cmd.display()))?
    };
    log::debug!("spawned {} (pid {})", cmd.display(), child.id());

    let (done_tx, done_rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = done_tx.send(pump_lines(BufReader::new(reader), &mut sink));
    });

    let exit_code = wait_child(&mut child, cmd, timeout)?;

    // A process the child left behind may still hold the pipe open; the pump thread is
    // detached instead of waited on forever.
    match done_rx.recv_timeout(PASSTHROUGH_DRAIN) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::warn!("output passthrough for {} stopped: {err}", cmd.display()),
        Err(mpsc::RecvTimeoutError::Timeout) => log::warn!(
            "output of {} is still held open by another process; not waiting for it",
            cmd.display()
        ),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            log::warn!("output passthrough for {} panicked", cmd.display())
        }
    }

    Ok(exit_code)
}

fn pump_lines<R: BufRead, W: Write>(mut reader: R, sink: &mut W) -> std::io::Result<()> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        sink.write_all(&line)?;
        sink.flush()?;
    }
}

pub fn run_redirected(
    cmd: &Path,
    args: &[&str],
    out: &File,
    timeout: Option<Duration>,
) -> Result<i32> {
    let stdout = out
        .try_clone()
        .context("failed to duplicate report file handle")?;
    let stderr = out
        .try_clone()
        .context("failed to duplicate report file handle")?;

    let mut child = Command::new(cmd)
        .args(args)
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .with_context(|| format!("failed to start process: {}", cmd.display()))?;
    log::debug!("spawned {} (pid {})", cmd.display(), child.id());

    wait_child(&mut child, cmd, timeout)
}

fn wait_child(child: &mut Child, cmd: &Path, timeout: Option<Duration>) -> Result<i32> {
    let status = match timeout {
        None => child
            .wait()
            .with_context(|| format!("failed to wait for process: {}", cmd.display()))?,
        Some(timeout) => match child
            .wait_timeout(timeout)
            .with_context(|| format!("failed to wait for process: {}", cmd.display()))?
        {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(anyhow!("timed out after {timeout:?}: {}", cmd.display()));
            }
        },
    };

    Ok(status.code().unwrap_or(-1))
}

fn sudo_home_dir(sudo_uid: Option<&str>) -> Option<PathBuf> {
    let uid = sudo_uid?.trim().parse::<u32>().ok()?;
    home_dir_for_uid(uid)
}

pub fn effective_home_dir() -> Result<PathBuf> {
    let sudo_uid = std::env::var("SUDO_UID").ok();
    if let Some(home) = sudo_home_dir(sudo_uid.as_deref()) {
        return Ok(home);
    }
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("HOME is not set"))
}

#[cfg(unix)]
fn home_dir_for_uid(uid: u32) -> Option<PathBuf> {
    use std::ffi::CStr;

    unsafe {
        let bufsize = libc::sysconf(libc::_SC_GETPW_R_SIZE_MAX);
        let bufsize = if bufsize <= 0 {
            16 * 1024
        } else {
            bufsize as usize
        };
        let mut buf = vec![0u8; bufsize];
        let mut pwd: libc::passwd = std::mem::zeroed();
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let rc = libc::getpwuid_r(
            uid as libc::uid_t,
            &mut pwd,
            buf.as_mut_ptr() as *mut libc::c_char,
            buf.len(),
            &mut result,
        );
        if rc != 0 || result.is_null() {
            return None;
        }
        if pwd.pw_dir.is_null() {
            return None;
        }

        let dir = CStr::from_ptr(pwd.pw_dir).to_string_lossy().to_string();
        if dir.trim().is_empty() {
            return None;
        }
        Some(PathBuf::from(dir))
    }
}

#[cfg(not(unix))]
fn home_dir_for_uid(_uid: u32) -> Option<PathBuf> {
    None
}
