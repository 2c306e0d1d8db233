// src/tree/sentinel.rs

//! Reading identity and status out of the files the engine generates inside
//! each task folder.

use std::path::Path;

use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::tree::classify::COMMAND_RUN;
use crate::tree::node::Node;

pub const EXITCODE: &str = ".exitcode";
pub const TASK_MARKER: &str = "# NEXTFLOW TASK: ";
pub const RUN_NAME_MARKER: &str = "Run name: ";
pub const ENGINE_LOG: &str = ".nextflow.log";

/// Exit status the engine records when it terminated the task itself.
/// Treated as success everywhere.
pub const KILLED_BY_ENGINE: i32 = 143;

pub fn is_success(code: i32) -> bool {
    code == 0 || code == KILLED_BY_ENGINE
}

pub fn is_failure(code: i32) -> bool {
    !is_success(code)
}

/// Label and exit code found in a process folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentinels {
    pub label: Option<String>,
    pub exit_code: Option<i32>,
}

/// Scan the direct file children of a process folder for the task descriptor
/// and exit status. Unreadable or malformed files yield absent values.
pub fn extract(fs: &dyn FileSystem, process_folder: &Node) -> Sentinels {
    let mut found = Sentinels::default();

    for child in process_folder.children() {
        if child.is_directory() {
            continue;
        }
        let Some(path) = child.path() else {
            continue;
        };

        // A value once found sticks; backups and partial writes sharing the
        // name cannot clear it.
        if child.name.contains(COMMAND_RUN) {
            if let Some(label) = read_sentinel(fs, path).and_then(|c| parse_task_label(&c)) {
                found.label = Some(label);
            }
        } else if child.name.contains(EXITCODE) {
            if let Some(code) = read_sentinel(fs, path).and_then(|c| parse_exit_code(&c)) {
                found.exit_code = Some(code);
            }
        }
    }

    debug!(
        folder = %process_folder.name,
        label = ?found.label,
        exit_code = ?found.exit_code,
        "extracted sentinels"
    );
    found
}

fn read_sentinel(fs: &dyn FileSystem, path: &Path) -> Option<String> {
    match fs.read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(err) => {
            warn!(path = ?path, error = %err, "failed to read sentinel file");
            None
        }
    }
}

/// Text after `# NEXTFLOW TASK: ` up to the end of that line.
pub fn parse_task_label(contents: &str) -> Option<String> {
    rest_of_line(contents, TASK_MARKER)
}

/// `None` when the file is empty or not an integer.
pub fn parse_exit_code(contents: &str) -> Option<i32> {
    contents.trim().parse::<i32>().ok()
}

/// Text after `Run name: ` in the engine log, up to the end of that line.
pub fn parse_run_name(contents: &str) -> Option<String> {
    rest_of_line(contents, RUN_NAME_MARKER)
}

fn rest_of_line(contents: &str, marker: &str) -> Option<String> {
    let start = contents.find(marker)? + marker.len();
    let rest = &contents[start..];
    let line = rest.split('\n').next().unwrap_or(rest);
    Some(line.trim_end_matches('\r').to_string())
}

/// Read the run name out of `<run_folder>/.nextflow.log`, if present.
pub fn read_run_name(fs: &dyn FileSystem, run_folder: &Path) -> Option<String> {
    let log = run_folder.join(ENGINE_LOG);
    if !fs.exists(&log) {
        return None;
    }
    match fs.read_to_string(&log) {
        Ok(contents) => parse_run_name(&contents),
        Err(err) => {
            debug!(path = ?log, error = %err, "engine log unreadable");
            None
        }
    }
}
