use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::identity::Identity;

pub fn report_file_name(rin: &str, date_stamp: &str) -> String {
    format!("{rin}_{date_stamp}.txt")
}

pub fn today_stamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_date_stamp(now.date())
}

pub fn format_date_stamp(date: Date) -> String {
    date.format(format_description!("[year][month][day]"))
        .unwrap_or_else(|_| {
            format!(
                "{:04}{:02}{:02}",
                date.year(),
                u8::from(date.month()),
                date.day()
            )
        })
}

pub fn parse_date_stamp(s: &str) -> Result<String> {
    let s = s.trim();
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(anyhow!("date stamp must be YYYYMMDD: {s}"));
    }
    let date = Date::parse(s, format_description!("[year][month][day]"))
        .with_context(|| format!("not a calendar date: {s}"))?;
    Ok(format_date_stamp(date))
}

pub fn create_report(path: &Path, identity: &Identity) -> Result<File> {
    let mut file = File::create(path)
        .with_context(|| format!("failed to create report: {}", path.display()))?;
    writeln!(file, "Tested by: {identity}")
        .with_context(|| format!("failed to write report header: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("failed to flush report: {}", path.display()))?;
    Ok(file)
}

pub fn archive_report(src: &Path, archive_dir: &Path) -> Result<PathBuf> {
    match std::fs::create_dir(archive_dir) {
        Ok(()) => log::info!("created archive directory {}", archive_dir.display()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
        Err(err) => {
            return Err(err).with_context(|| {
                format!(
                    "failed to create archive directory: {}",
                    archive_dir.display()
                )
            });
        }
    }

    let file_name = src
        .file_name()
        .ok_or_else(|| anyhow!("report path has no file name: {}", src.display()))?;
    let dest = archive_dir.join(file_name);

    match std::fs::rename(src, &dest) {
        Ok(()) => {}
        Err(err) if is_cross_device(&err) => {
            std::fs::copy(src, &dest).with_context(|| {
                format!("failed to copy {} -> {}", src.display(), dest.display())
            })?;
            std::fs::remove_file(src)
                .with_context(|| format!("failed to remove {}", src.display()))?;
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("failed to move {} -> {}", src.display(), dest.display())
            });
        }
    }

    log::info!("archived {} -> {}", src.display(), dest.display());
    Ok(dest)
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn is_cross_device(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn temp_dir() -> PathBuf {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "bcmqa-report-test-{}-{seq}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create dir");
        dir
    }

    #[test]
    fn file_name_follows_rin_and_date() {
        assert_eq!(report_file_name("devA", "20240101"), "devA_20240101.txt");
    }

    #[test]
    fn date_stamp_is_validated() {
        assert_eq!(parse_date_stamp("20240229").expect("leap day"), "20240229");
        assert!(parse_date_stamp("20230229").is_err());
        assert!(parse_date_stamp("2024-01-01").is_err());
        assert!(parse_date_stamp("240101").is_err());
    }

    #[test]
    fn today_stamp_is_eight_digits() {
        let s = today_stamp();
        assert_eq!(s.len(), 8);
        assert!(s.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn archive_moves_file_and_leaves_no_source() {
        let dir = temp_dir();
        let home = dir.join("home");
        std::fs::create_dir_all(home.join("Desktop")).expect("mkdir desktop");
        let src = dir.join("devA_20240101.txt");
        std::fs::write(&src, b"Tested by: jdoe\nPASS a\n").expect("write");

        let archive_dir = home.join("Desktop/Test_Results");
        let dest = archive_report(&src, &archive_dir).expect("archive");

        assert_eq!(dest, archive_dir.join("devA_20240101.txt"));
        assert!(!src.exists());
        assert_eq!(
            std::fs::read(&dest).expect("read dest"),
            b"Tested by: jdoe\nPASS a\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn archive_replaces_same_day_report() {
        let dir = temp_dir();
        let archive_dir = dir.join("Test_Results");
        std::fs::create_dir(&archive_dir).expect("mkdir");
        std::fs::write(archive_dir.join("devA_20240101.txt"), b"old").expect("write old");
        let src = dir.join("devA_20240101.txt");
        std::fs::write(&src, b"new").expect("write new");

        let dest = archive_report(&src, &archive_dir).expect("archive");
        assert_eq!(std::fs::read(&dest).expect("read"), b"new");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn archive_does_not_create_missing_parent() {
        let dir = temp_dir();
        let src = dir.join("devA_20240101.txt");
        std::fs::write(&src, b"x").expect("write");

        let err = archive_report(&src, &dir.join("no/such/Test_Results"))
            .expect_err("parent is missing");
        assert!(err.to_string().contains("archive directory"), "err={err}");
        assert!(src.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn header_is_first_line() {
        let dir = temp_dir();
        let path = dir.join("devB_20240101.txt");
        std::fs::write(&path, b"stale content that must go away\n").expect("write stale");

        let identity = crate::identity::resolve_identity(&{
            let p = dir.join("username");
            std::fs::write(&p, "jdoe").expect("write identity");
            p
        })
        .expect("identity");
        drop(create_report(&path, &identity).expect("create"));

        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "Tested by: jdoe\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
