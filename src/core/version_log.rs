//! Version Log - History of every store mutation
//!
//! The store records one commit per mutation through the [`VersionLog`]
//! trait. [`GitLog`] shells out to `git` with an argument vector and the
//! store root as working directory; [`MemoryLog`] keeps commits in memory
//! for tests and embedders that do not want a repository.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{KnowledgeError, Result};

/// Field separator used in `git log --format`
const FIELD_SEP: char = '\x1f';

/// A commit read back from the version log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Backend for recording and querying store history
///
/// Paths are relative to the store root.
pub trait VersionLog: Send + Sync {
    /// Create the log if it does not exist yet (idempotent)
    fn init(&self) -> Result<()>;

    /// Stage `paths` (including deletions) and commit them
    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<()>;

    /// Stage everything under the root and commit, even if nothing changed
    fn commit_all(&self, message: &str) -> Result<()>;

    /// Record removal of `path`; a path the log never knew is not an error
    fn remove_path(&self, path: &Path, message: &str) -> Result<()>;

    /// Commits touching `path`, newest first
    fn history(&self, path: &Path) -> Result<Vec<Commit>>;

    /// Textual diff between two revisions, optionally limited to one path
    fn diff(&self, rev_a: &str, rev_b: &str, path: Option<&Path>) -> Result<String>;
}

/// Git-backed version log
#[derive(Debug, Clone)]
pub struct GitLog {
    root: PathBuf,
    binary: String,
    author_name: String,
    author_email: String,
}

impl GitLog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            binary: "git".to_string(),
            author_name: "knowhow".to_string(),
            author_email: "knowhow@localhost".to_string(),
        }
    }

    /// Use a different executable than `git` on `PATH`
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Identity recorded on commits
    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run git with `args`; non-zero exit becomes `VersionLogFailure`
    fn run<S: AsRef<std::ffi::OsStr>>(&self, args: &[S]) -> Result<String> {
        let (status, stdout, output) = self.run_raw(args)?;
        if !status.success() {
            return Err(KnowledgeError::VersionLogFailure {
                command: self.describe(args),
                output,
            });
        }
        Ok(stdout)
    }

    /// Run git and return (status, stdout, stdout+stderr) without judging the exit code
    fn run_raw<S: AsRef<std::ffi::OsStr>>(
        &self,
        args: &[S],
    ) -> Result<(std::process::ExitStatus, String, String)> {
        debug!(command = %self.describe(args), "running version log command");

        let output = Command::new(&self.binary)
            .arg("-c")
            .arg(format!("user.name={}", self.author_name))
            .arg("-c")
            .arg(format!("user.email={}", self.author_email))
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| KnowledgeError::VersionLogFailure {
                command: self.describe(args),
                output: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{}{}", stdout, stderr).trim().to_string();
        Ok((output.status, stdout, combined))
    }

    fn describe<S: AsRef<std::ffi::OsStr>>(&self, args: &[S]) -> String {
        let mut parts = vec![self.binary.clone()];
        parts.extend(args.iter().map(|a| a.as_ref().to_string_lossy().to_string()));
        parts.join(" ")
    }

    fn has_staged_changes(&self, path: Option<&Path>) -> Result<bool> {
        let mut args: Vec<std::ffi::OsString> =
            vec!["diff".into(), "--cached".into(), "--quiet".into()];
        if let Some(path) = path {
            args.push("--".into());
            args.push(path.into());
        }
        let (status, _, output) = self.run_raw(&args)?;
        match status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(KnowledgeError::VersionLogFailure {
                command: self.describe(&args),
                output,
            }),
        }
    }
}

impl VersionLog for GitLog {
    fn init(&self) -> Result<()> {
        if self.root.join(".git").exists() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.root)?;
        self.run(&["init", "-q"])?;
        self.run(&["add", "-A"])?;
        self.run(&["commit", "-q", "--allow-empty", "-m", "Initialize knowledge store"])?;
        debug!(root = %self.root.display(), "initialized version log");
        Ok(())
    }

    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let mut add: Vec<std::ffi::OsString> = vec!["add".into(), "-A".into(), "--".into()];
        add.extend(paths.iter().map(|p| p.as_os_str().to_owned()));
        self.run(&add)?;

        self.run(&["commit", "-q", "-m", message])?;
        Ok(())
    }

    fn commit_all(&self, message: &str) -> Result<()> {
        self.run(&["add", "-A"])?;
        self.run(&["commit", "-q", "--allow-empty", "-m", message])?;
        Ok(())
    }

    fn remove_path(&self, path: &Path, message: &str) -> Result<()> {
        let rm: Vec<std::ffi::OsString> = vec![
            "rm".into(),
            "-q".into(),
            "--cached".into(),
            "--ignore-unmatch".into(),
            "--".into(),
            path.into(),
        ];
        self.run(&rm)?;

        if !self.has_staged_changes(Some(path))? {
            debug!(path = %path.display(), "path already absent from version log");
            return Ok(());
        }

        self.run(&["commit", "-q", "-m", message])?;
        Ok(())
    }

    fn history(&self, path: &Path) -> Result<Vec<Commit>> {
        let format = format!("--format=%H{0}%an{0}%aI{0}%s", FIELD_SEP);
        let args: Vec<std::ffi::OsString> = vec![
            "log".into(),
            "--follow".into(),
            format.into(),
            "--".into(),
            path.into(),
        ];
        let stdout = self.run(&args)?;
        Ok(parse_history(&stdout))
    }

    fn diff(&self, rev_a: &str, rev_b: &str, path: Option<&Path>) -> Result<String> {
        let mut args: Vec<std::ffi::OsString> = vec!["diff".into(), rev_a.into(), rev_b.into()];
        if let Some(path) = path {
            args.push("--".into());
            args.push(path.into());
        }
        self.run(&args)
    }
}

/// Parse `git log` output (one `hash\x1fauthor\x1fdate\x1fsubject` per line)
///
/// Lines that do not parse are skipped; partial history beats none.
pub fn parse_history(output: &str) -> Vec<Commit> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let commit = parse_history_line(line);
            if commit.is_none() {
                warn!(line = %line, "skipping unparseable history line");
            }
            commit
        })
        .collect()
}

fn parse_history_line(line: &str) -> Option<Commit> {
    let mut fields = line.splitn(4, FIELD_SEP);
    let hash = fields.next()?.trim();
    let author = fields.next()?;
    let timestamp = DateTime::parse_from_rfc3339(fields.next()?.trim()).ok()?;
    let message = fields.next()?;

    if hash.is_empty() {
        return None;
    }

    Some(Commit {
        hash: hash.to_string(),
        author: author.to_string(),
        timestamp: timestamp.with_timezone(&Utc),
        message: message.to_string(),
    })
}

/// A commit as seen by [`MemoryLog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommit {
    pub message: String,
    /// Empty for `commit_all`
    pub paths: Vec<PathBuf>,
    pub timestamp: DateTime<Utc>,
}

/// In-memory version log
///
/// Records commits instead of running a tool. `set_failing(true)` makes
/// every mutating call return `VersionLogFailure`.
#[derive(Debug, Default)]
pub struct MemoryLog {
    commits: Mutex<Vec<RecordedCommit>>,
    failing: Mutex<bool>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(PoisonError::into_inner) = failing;
    }

    /// All recorded commits, oldest first
    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.commits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, message: &str, paths: Vec<PathBuf>) -> Result<()> {
        if *self.failing.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(KnowledgeError::VersionLogFailure {
                command: "memory commit".to_string(),
                output: "version log set to fail".to_string(),
            });
        }
        self.commits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCommit {
                message: message.to_string(),
                paths,
                timestamp: Utc::now(),
            });
        Ok(())
    }
}

impl VersionLog for MemoryLog {
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<()> {
        self.record(message, paths.to_vec())
    }

    fn commit_all(&self, message: &str) -> Result<()> {
        self.record(message, Vec::new())
    }

    fn remove_path(&self, path: &Path, message: &str) -> Result<()> {
        self.record(message, vec![path.to_path_buf()])
    }

    fn history(&self, path: &Path) -> Result<Vec<Commit>> {
        let commits = self.commits.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(commits
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, c)| c.paths.is_empty() || c.paths.iter().any(|p| p == path))
            .map(|(i, c)| Commit {
                hash: format!("{:040x}", i + 1),
                author: "memory".to_string(),
                timestamp: c.timestamp,
                message: c.message.clone(),
            })
            .collect())
    }

    fn diff(&self, _rev_a: &str, _rev_b: &str, _path: Option<&Path>) -> Result<String> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_parse_history() {
        let output = format!(
            "abc123{0}Ada{0}2024-05-01T10:00:00+02:00{0}Update swift_testing.md\n\
             def456{0}Ada{0}not-a-date{0}Broken line\n\
             \n\
             0a1b2c{0}Bob{0}2024-04-30T08:00:00Z{0}Add: swift | with pipe\n",
            FIELD_SEP
        );

        let commits = parse_history(&output);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "abc123");
        assert_eq!(commits[0].author, "Ada");
        assert_eq!(commits[0].timestamp.to_rfc3339(), "2024-05-01T08:00:00+00:00");
        assert_eq!(commits[1].message, "Add: swift | with pipe");
    }

    #[test]
    fn test_parse_history_truncated_line() {
        assert!(parse_history("only-a-hash").is_empty());
    }

    #[test]
    fn test_memory_log_records_and_fails() {
        let log = MemoryLog::new();
        log.commit_paths(&[PathBuf::from("a.md")], "Add a").unwrap();
        log.commit_all("Consolidate").unwrap();
        log.remove_path(Path::new("b.md"), "Delete b").unwrap();

        let history = log.history(Path::new("a.md")).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "Consolidate");
        assert_eq!(history[1].message, "Add a");

        log.set_failing(true);
        assert!(matches!(
            log.commit_all("x"),
            Err(KnowledgeError::VersionLogFailure { .. })
        ));
        assert_eq!(log.commits().len(), 3);
    }

    #[test]
    fn test_git_log_round_trip() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let log = GitLog::new(dir.path());

        log.init().unwrap();
        assert!(dir.path().join(".git").exists());
        // Second init is a no-op
        log.init().unwrap();

        std::fs::write(dir.path().join("a.md"), "one").unwrap();
        log.commit_paths(&[PathBuf::from("a.md")], "Add a").unwrap();
        std::fs::write(dir.path().join("a.md"), "two").unwrap();
        log.commit_paths(&[PathBuf::from("a.md")], "Update a").unwrap();

        let history = log.history(Path::new("a.md")).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "Update a");
        assert_eq!(history[0].author, "knowhow");
        assert_eq!(history[1].message, "Add a");

        let diff = log
            .diff(&history[1].hash, &history[0].hash, Some(Path::new("a.md")))
            .unwrap();
        assert!(diff.contains("-one"));
        assert!(diff.contains("+two"));

        std::fs::remove_file(dir.path().join("a.md")).unwrap();
        log.remove_path(Path::new("a.md"), "Delete a").unwrap();
        assert_eq!(log.history(Path::new("a.md")).unwrap().len(), 3);

        // Removing again is idempotent
        log.remove_path(Path::new("a.md"), "Delete a again").unwrap();
        log.remove_path(Path::new("never.md"), "Delete never").unwrap();
        assert_eq!(log.history(Path::new("a.md")).unwrap().len(), 3);

        // commit_all lands even with nothing to stage
        log.commit_all("Consolidation pass").unwrap();
    }

    #[test]
    fn test_git_log_failure_carries_output() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let log = GitLog::new(dir.path());
        log.init().unwrap();

        let err = log.diff("no-such-rev", "HEAD", None).unwrap_err();
        match err {
            KnowledgeError::VersionLogFailure { command, output } => {
                assert!(command.contains("diff"));
                assert!(!output.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_binary_is_version_log_failure() {
        let dir = TempDir::new().unwrap();
        let log = GitLog::new(dir.path()).with_binary("definitely-not-a-real-vcs-binary");
        assert!(matches!(
            log.init(),
            Err(KnowledgeError::VersionLogFailure { .. })
        ));
    }
}
