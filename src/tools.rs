//! External programs: `rojo`, `wally`, `rokit`, and the user's editor.
//!
//! Build and install tools run in the foreground with inherited stdio, one
//! after another, from the repository root. A non-zero exit becomes
//! [`ToolError::Failed`] carrying the tool's own code so the CLI can exit with
//! it. There is no retry, timeout or supervision.
//!
//! Editors are spawned detached and never waited on.

use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

/// Exit code reported when a program could not be started at all.
pub const SPAWN_FAILURE_CODE: i32 = 127;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with code {code}")]
    Failed { program: String, code: i32 },
}

impl ToolError {
    /// Process exit code to propagate for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ToolError::Spawn { .. } => SPAWN_FAILURE_CODE,
            ToolError::Failed { code, .. } => *code,
        }
    }
}

/// Human-readable command line, for progress output.
pub fn describe(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `program` to completion in `cwd`, inheriting stdio.
pub fn run(program: &str, args: &[&str], cwd: &Path) -> Result<(), ToolError> {
    debug!(command = %describe(program, args), cwd = %cwd.display(), "running");
    let status = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .status()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        // Killed by a signal: no code, report as a generic failure.
        Err(ToolError::Failed {
            program: program.to_string(),
            code: status.code().unwrap_or(1),
        })
    }
}

pub fn rojo_build(root: &Path, project: &str, output: &str) -> Result<(), ToolError> {
    run("rojo", &["build", project, "-o", output], root)
}

pub fn rojo_serve(root: &Path, project: &str) -> Result<(), ToolError> {
    run("rojo", &["serve", project], root)
}

/// Install steps run by `setup`, in order.
pub const INSTALL_STEPS: &[(&str, &[&str])] = &[("wally", &["install"]), ("rokit", &["install"])];

// ============================================================================
// Editor
// ============================================================================

/// A candidate way to open a file, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EditorCommand {
    fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }
}

/// Editor candidates for `path`, most specific first.
///
/// 1. VS Code's `code -g <path>:1` when `code` is on `PATH`.
/// 2. `$VISUAL` or `$EDITOR`, split on whitespace so `"code -w"` works.
/// 3. The platform opener.
pub fn editor_commands(path: &Path, has_code: bool, editor: Option<&str>) -> Vec<EditorCommand> {
    let file = path.to_string_lossy().into_owned();
    let mut candidates = Vec::new();

    if has_code {
        candidates.push(EditorCommand::new("code", vec!["-g".into(), format!("{file}:1")]));
    }

    if let Some(editor) = editor {
        let mut words = editor.split_whitespace();
        if let Some(program) = words.next() {
            let mut args: Vec<String> = words.map(str::to_string).collect();
            args.push(file.clone());
            candidates.push(EditorCommand::new(program, args));
        }
    }

    candidates.push(if cfg!(target_os = "macos") {
        EditorCommand::new("open", vec![file])
    } else if cfg!(windows) {
        EditorCommand::new("cmd", vec!["/c".into(), "start".into(), String::new(), file])
    } else {
        EditorCommand::new("xdg-open", vec![file])
    });
    candidates
}

fn on_path(program: &str) -> bool {
    let finder = if cfg!(windows) { "where" } else { "which" };
    Command::new(finder)
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

fn configured_editor() -> Option<String> {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

/// Open `path` in an editor without waiting for it. Failure is only a warning.
pub fn open_in_editor(path: &Path, cwd: &Path) {
    let editor = configured_editor();
    for candidate in editor_commands(path, on_path("code"), editor.as_deref()) {
        let spawned = Command::new(&candidate.program)
            .args(&candidate.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(_) => {
                debug!(program = %candidate.program, path = %path.display(), "opened editor");
                return;
            }
            Err(e) => debug!(program = %candidate.program, error = %e, "editor unavailable"),
        }
    }
    warn!(path = %path.display(), "no editor could be started");
}
