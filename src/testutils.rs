use super::*;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub fn with_default_test_directory<F>(test_method: F)
where
    F: Fn(&PathBuf),
{
    let test_dir_name = "./test_output/output".to_owned() + &random_string();
    with_test_directory(&PathBuf::from(test_dir_name), test_method);
}

pub fn with_test_directory<F>(test_dir: &PathBuf, test_method: F)
where
    F: Fn(&PathBuf),
{
    // Make sure test directory exists and is empty
    if test_dir.is_dir() {
        fs::remove_dir_all(test_dir).unwrap();
    }
    fs::create_dir_all(test_dir).unwrap();
    assert_eq!(test_dir.is_dir(), true);

    test_method(test_dir);

    // Clean up
    fs::remove_dir_all(test_dir).unwrap();
}

/// Writes `contents` to `path`, creating parent directories as needed.
pub fn write_test_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
    assert_eq!(path.is_file(), true);
}

/// Every file and link under `root`, as sorted `/`-joined relative paths.
pub fn relative_entries(root: &Path) -> Vec<String> {
    let mut entries: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| !entry.file_type().is_dir())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<String>>()
                .join("/")
        })
        .collect();
    entries.sort();
    entries
}

pub fn dummy_sync_context() -> SyncContext {
    SyncContext { dry_run: false }
}

pub fn dry_run_sync_context() -> SyncContext {
    SyncContext { dry_run: true }
}

/// Records every command instead of running it. Fails any command whose
/// line starts with `fail_on`.
pub struct RecordingRunner {
    pub commands: RefCell<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> RecordingRunner {
        RecordingRunner { commands: RefCell::new(vec![]), fail_on: None }
    }

    pub fn failing_on(command: &str) -> RecordingRunner {
        RecordingRunner { commands: RefCell::new(vec![]), fail_on: Some(command.to_string()) }
    }

    pub fn recorded(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, working_dir: &Path, program: &str, args: &[&str], context: &SyncContext) -> Result<()> {
        assert_eq!(working_dir.is_dir(), true);
        let command_line = format_command(program, args);
        if context.dry_run {
            return Ok(());
        }
        self.commands.borrow_mut().push(command_line.clone());
        match self.fail_on {
            Some(ref failing) if command_line.starts_with(failing.as_str()) => {
                bail!(ErrorKind::CommandFailed(command_line, "exit code: 1".to_string()))
            }
            _ => Ok(()),
        }
    }
}

pub fn random_string() -> String {
    let random_number = rand::random::<u32>();
    println!("Using random number: {:?}", random_number);
    random_number.to_string()
}
