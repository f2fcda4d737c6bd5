// Author: Dustin Pilgrim
// License: MIT

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024; // 5 MiB
const DEFAULT_KEEP_BACKUPS: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct LogPolicy {
    pub max_bytes: u64,
    pub keep_backups: u32,
}

impl Default for LogPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            keep_backups: DEFAULT_KEEP_BACKUPS,
        }
    }
}

/// `~/.cache/vigil/vigil.log`
pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("vigil").join("vigil.log"))
}

/// Ensures the log directory exists and rotates the file if needed.
/// Returns whether to insert a blank line before the next run header.
pub fn prepare_log_file(path: &Path, policy: LogPolicy) -> io::Result<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if meta.len() == 0 {
        return Ok(false);
    }

    if meta.len() >= policy.max_bytes {
        rotate(path, policy.keep_backups)?;
        return Ok(false);
    }

    Ok(true)
}

pub fn run_header() -> String {
    let pid = std::process::id();
    let started = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("==================== vigil run start {started} (pid={pid}) ====================")
}

/// Appends a line verbatim, bypassing the subscriber's formatting.
pub fn write_raw_line(path: &Path, line: &str) -> io::Result<()> {
    let mut f = fs::OpenOptions::new().create(true).append(true).open(path)?;
    f.write_all(line.as_bytes())?;
    f.write_all(b"\n")?;
    f.flush()?;
    Ok(())
}

fn rotate(path: &Path, keep_backups: u32) -> io::Result<()> {
    if keep_backups == 0 {
        let _ = fs::remove_file(path);
        return Ok(());
    }

    for i in (1..keep_backups).rev() {
        let from = rotated_name(path, i);
        let to = rotated_name(path, i + 1);
        if from.exists() {
            let _ = fs::rename(from, to);
        }
    }

    let _ = fs::rename(path, rotated_name(path, 1));
    Ok(())
}

fn rotated_name(base: &Path, n: u32) -> PathBuf {
    PathBuf::from(format!("{}.{}", base.display(), n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vigil-logfile-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_or_empty_file_needs_no_blank_line() {
        let dir = scratch_dir("fresh");
        let path = dir.join("vigil.log");
        assert!(!prepare_log_file(&path, LogPolicy::default()).unwrap());

        fs::write(&path, b"").unwrap();
        assert!(!prepare_log_file(&path, LogPolicy::default()).unwrap());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn oversized_file_is_rotated() {
        let dir = scratch_dir("rotate");
        let path = dir.join("vigil.log");
        fs::write(&path, b"0123456789").unwrap();
        fs::write(rotated_name(&path, 1), b"older").unwrap();

        let policy = LogPolicy {
            max_bytes: 4,
            keep_backups: 2,
        };
        assert!(!prepare_log_file(&path, policy).unwrap());

        assert!(!path.exists());
        assert_eq!(fs::read(rotated_name(&path, 1)).unwrap(), b"0123456789");
        assert_eq!(fs::read(rotated_name(&path, 2)).unwrap(), b"older");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn small_file_is_kept() {
        let dir = scratch_dir("keep");
        let path = dir.join("vigil.log");
        write_raw_line(&path, &run_header()).unwrap();

        assert!(prepare_log_file(&path, LogPolicy::default()).unwrap());
        assert!(fs::read_to_string(&path).unwrap().contains("vigil run start"));

        let _ = fs::remove_dir_all(&dir);
    }
}
