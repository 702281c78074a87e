//! filebot invocation.
//!
//! One `filebot -rename` call is made per extension group. The command is always built
//! as an argument vector and run without a shell; the `*.ext` wildcard is expanded here
//! by listing the staging directory, so paths with spaces or shell metacharacters are
//! passed through untouched.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::errors::{QbotError, Result};
use crate::fs_ops::file_extension;

/// Generates `as_str`, `Display` and `FromStr` for a closed set of string-named variants.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = QbotError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(QbotError::UnrecognizedVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// What filebot does with each matched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Move,
    Copy,
    Symlink,
    Hardlink,
    /// Dry run inside filebot; nothing is placed.
    Test,
}

string_enum!(Action, "action", {
    Move => "move",
    Copy => "copy",
    Symlink => "symlink",
    Hardlink => "hardlink",
    Test => "test",
});

impl Action {
    /// True if the staged files must outlive the run (links point into staging, or
    /// filebot did not place anything).
    pub fn keeps_staged_files(self) -> bool {
        matches!(self, Action::Symlink | Action::Test)
    }
}

/// How filebot resolves an existing file at the target name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conflict {
    #[default]
    Skip,
    Replace,
    Auto,
    Index,
    Fail,
}

string_enum!(Conflict, "conflict", {
    Skip => "skip",
    Replace => "replace",
    Auto => "auto",
    Index => "index",
    Fail => "fail",
});

/// Metadata catalog filebot matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Database {
    TheMovieDbTv,
    TheMovieDb,
    TheTvDb,
    AniDb,
    Omdb,
}

string_enum!(Database, "database", {
    TheMovieDbTv => "TheMovieDB::TV",
    TheMovieDb => "TheMovieDB",
    TheTvDb => "TheTVDB",
    AniDb => "AniDB",
    Omdb => "OMDb",
});

/// A single `filebot -rename` call.
#[derive(Debug, Clone)]
pub struct RenameRequest {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub query: Option<String>,
    pub format: String,
    pub db: Database,
    pub action: Action,
    pub conflict: Conflict,
    pub language: String,
    pub filter: Option<String>,
}

impl RenameRequest {
    /// Argument vector, program name excluded.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(self.inputs.len() + 20);
        args.push("-rename".into());
        args.extend(self.inputs.iter().map(|p| p.as_os_str().to_os_string()));
        args.push("-r".into());
        push_pair(&mut args, "--db", self.db.as_str());
        push_pair(&mut args, "--format", &self.format);
        if let Some(q) = self.query.as_deref().filter(|q| !q.is_empty()) {
            push_pair(&mut args, "--q", q);
        }
        push_pair(&mut args, "--action", self.action.as_str());
        push_pair(&mut args, "--conflict", self.conflict.as_str());
        push_pair(&mut args, "--lang", &self.language);
        push_pair(&mut args, "--output", self.output.as_os_str());
        args.push("-non-strict".into());
        if let Some(filter) = self.filter.as_deref() {
            push_pair(&mut args, "--filter", filter);
        }
        args
    }
}

fn push_pair(args: &mut Vec<OsString>, flag: &str, value: impl AsRef<OsStr>) {
    args.push(flag.into());
    args.push(value.as_ref().to_os_string());
}

/// True for dotfiles (including AppleDouble `._name` companions), which `*.ext` never matches.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

/// List regular files directly inside `dir` whose extension equals `ext`
/// (case-insensitive), sorted by path. Dotfiles are skipped, as a shell glob would.
pub fn expand_wildcard(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let pattern = || format!("{}", dir.join(format!("*.{ext}")).display());
    let entries = fs::read_dir(dir).map_err(|e| QbotError::Walk {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| QbotError::Walk {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        match entry.file_type() {
            Ok(ft) if ft.is_file() => {}
            _ => continue,
        }
        if file_extension(&path).as_deref() == Some(ext) {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(QbotError::NoMatchingFiles { pattern: pattern() });
    }
    matches.sort();
    debug!(pattern = %pattern(), count = matches.len(), "expanded wildcard");
    Ok(matches)
}

/// Handle on the filebot executable.
#[derive(Debug, Clone)]
pub struct Filebot {
    program: PathBuf,
}

impl Filebot {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Printable command line, for logs and dry runs only. Never executed.
    pub fn display_command(&self, request: &RenameRequest) -> String {
        let mut line = self.program.display().to_string();
        for arg in request.args() {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push_str(&format!(" '{arg}'"));
            } else {
                line.push(' ');
                line.push_str(&arg);
            }
        }
        line
    }

    /// Run filebot and return its output. stdout and stderr share one pipe, so the
    /// text is interleaved in the order the tool wrote it.
    pub fn rename(&self, request: &RenameRequest) -> Result<String> {
        info!(command = %self.display_command(request), "Executing filebot");

        let spawn_failed = |e: io::Error| QbotError::Invocation {
            message: format!("failed to execute '{}': {e}", self.program.display()),
            output: String::new(),
        };

        let (mut reader, writer) = io::pipe().map_err(spawn_failed)?;
        let mut cmd = Command::new(&self.program);
        cmd.args(request.args())
            .stdin(Stdio::null())
            .stdout(writer.try_clone().map_err(spawn_failed)?)
            .stderr(writer);
        let mut child = cmd.spawn().map_err(spawn_failed)?;
        // The command still holds write ends; release them so the read sees EOF.
        drop(cmd);

        let mut raw = Vec::new();
        let read = reader.read_to_end(&mut raw);
        let status = child.wait().map_err(|e| QbotError::Invocation {
            message: format!("failed to wait for '{}': {e}", self.program.display()),
            output: String::from_utf8_lossy(&raw).into_owned(),
        })?;
        let combined = String::from_utf8_lossy(&raw).into_owned();
        read.map_err(|e| QbotError::Invocation {
            message: format!("failed to read output of '{}': {e}", self.program.display()),
            output: combined.clone(),
        })?;

        if !status.success() {
            warn!(%status, "filebot failed");
            return Err(QbotError::Invocation {
                message: format!("'{}' exited with {}", self.program.display(), status),
                output: combined,
            });
        }
        debug!(output = %combined.trim_end(), "filebot output");
        Ok(combined)
    }
}
