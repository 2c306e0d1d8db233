#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use runlens::fs::mock::MockFileSystem;
use runlens::fs::FileSystem;
use runlens::provider::{PipelineRegistry, PipelineRunContext, ProviderOptions, RunsProvider};
use runlens::tree::TreeBuilder;

/// `.command.run` body carrying a task descriptor line.
pub fn command_run_script(label: &str) -> String {
    format!(
        "#!/bin/bash\n# NEXTFLOW TASK: {label}\nset -e\nset -u\nnxf_main() {{\n  :\n}}\n"
    )
}

/// One task folder `<work>/<hash>/` inside a run folder.
#[derive(Debug, Clone)]
pub struct TaskFixture {
    pub work: String,
    pub hash: String,
    pub label: Option<String>,
    pub exit_code: Option<String>,
    pub modified_ms: u64,
    pub files: Vec<(String, String)>,
}

impl TaskFixture {
    pub fn new(work: &str, hash: &str) -> Self {
        Self {
            work: work.to_string(),
            hash: hash.to_string(),
            label: None,
            exit_code: None,
            modified_ms: 0,
            files: Vec::new(),
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn exit(mut self, code: i32) -> Self {
        self.exit_code = Some(format!("{code}"));
        self
    }

    /// Raw `.exitcode` contents, for malformed values.
    pub fn exit_raw(mut self, contents: &str) -> Self {
        self.exit_code = Some(contents.to_string());
        self
    }

    pub fn modified(mut self, ms: u64) -> Self {
        self.modified_ms = ms;
        self
    }

    pub fn file(mut self, name: &str, contents: &str) -> Self {
        self.files.push((name.to_string(), contents.to_string()));
        self
    }

    fn command_run(&self) -> String {
        match self.label.as_deref() {
            Some(label) => command_run_script(label),
            None => "#!/bin/bash\nset -e\n".to_string(),
        }
    }
}

/// Populates a run folder on a [`MockFileSystem`].
pub struct MockRun<'a> {
    fs: &'a MockFileSystem,
    dir: PathBuf,
}

impl<'a> MockRun<'a> {
    pub fn new(fs: &'a MockFileSystem, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs.add_dir(&dir);
        Self { fs, dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the task folder and return its path.
    pub fn task(&self, task: TaskFixture) -> PathBuf {
        let proc_dir = self.dir.join(&task.work).join(&task.hash);
        let ms = task.modified_ms;
        self.fs
            .add_file_with_mtime(proc_dir.join(".command.run"), task.command_run(), ms);
        if let Some(code) = task.exit_code.as_deref() {
            self.fs.add_file_with_mtime(proc_dir.join(".exitcode"), code, ms);
        }
        for (name, contents) in task.files.iter() {
            self.fs
                .add_file_with_mtime(proc_dir.join(name), contents.as_str(), ms);
        }
        self.fs.set_modified(&proc_dir, ms);
        proc_dir
    }

    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.join(name);
        self.fs.add_file(&path, contents);
        path
    }
}

/// Write a task folder under `run_dir` on the real filesystem.
pub fn write_task(run_dir: &Path, task: &TaskFixture) -> std::io::Result<PathBuf> {
    let proc_dir = run_dir.join(&task.work).join(&task.hash);
    fs::create_dir_all(&proc_dir)?;
    fs::write(proc_dir.join(".command.run"), task.command_run())?;
    if let Some(code) = task.exit_code.as_deref() {
        fs::write(proc_dir.join(".exitcode"), code)?;
    }
    for (name, contents) in task.files.iter() {
        fs::write(proc_dir.join(name), contents)?;
    }
    Ok(proc_dir)
}

pub fn context(name: &str, storage_root: impl Into<PathBuf>) -> Arc<PipelineRunContext> {
    Arc::new(PipelineRunContext::new(name, storage_root))
}

/// Provider over `fs` knowing the pipelines `(name, storage_root)`.
pub fn provider_over(fs: Arc<dyn FileSystem>, pipelines: &[(&str, &str)]) -> RunsProvider {
    let mut registry = PipelineRegistry::new();
    for (name, root) in pipelines {
        registry.insert(PipelineRunContext::new(*name, *root));
    }
    RunsProvider::new(TreeBuilder::new(fs), registry, ProviderOptions::default())
}

pub fn mock_provider(fs: &MockFileSystem, pipelines: &[(&str, &str)]) -> RunsProvider {
    provider_over(Arc::new(fs.clone()), pipelines)
}
