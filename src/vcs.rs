use std::path::{Path, PathBuf};
use std::process::Command;

use context::SyncContext;
use error::*;

/// Runs an external program in a working directory. Output goes straight to the terminal.
pub trait CommandRunner {
    fn run(&self, working_dir: &Path, program: &str, args: &[&str], context: &SyncContext) -> Result<()>;
}

pub fn format_command(program: &str, args: &[&str]) -> String {
    let mut command_line = program.to_string();
    for arg in args {
        command_line.push(' ');
        if arg.contains(char::is_whitespace) {
            command_line.push('"');
            command_line.push_str(arg);
            command_line.push('"');
        } else {
            command_line.push_str(arg);
        }
    }
    command_line
}

pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, working_dir: &Path, program: &str, args: &[&str], context: &SyncContext) -> Result<()> {
        let command_line = format_command(program, args);
        info!("[{}] {}", working_dir.to_string_lossy(), command_line);
        if context.dry_run {
            return Ok(());
        }

        let status = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .status()
            .chain_err(|| format!("Unable to run '{}' in {}", command_line, working_dir.to_string_lossy()))?;
        if !status.success() {
            bail!(ErrorKind::CommandFailed(command_line, status.to_string()));
        }
        Ok(())
    }
}

/// A git checkout driven through a `CommandRunner`.
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    context: &'a SyncContext,
    repository: PathBuf,
}

impl<'a> Git<'a> {
    /// Fails with `DirectoryNotFound` if the checkout does not exist.
    pub fn open(runner: &'a dyn CommandRunner, context: &'a SyncContext, repository: &Path) -> Result<Git<'a>> {
        if !repository.is_dir() {
            bail!(ErrorKind::DirectoryNotFound(repository.to_path_buf()));
        }
        info!("In dir {}", repository.to_string_lossy());
        Ok(Git { runner, context, repository: repository.to_path_buf() })
    }

    pub fn pull(&self) -> Result<()> {
        self.git(&["pull"])
    }

    pub fn pull_from(&self, remote: &str, branch: &str) -> Result<()> {
        self.git(&["pull", remote, branch])
    }

    pub fn checkout(&self, revision: &str) -> Result<()> {
        self.git(&["checkout", revision])
    }

    pub fn add_all(&self) -> Result<()> {
        self.git(&["add", "."])
    }

    pub fn commit_all(&self, message: &str) -> Result<()> {
        self.git(&["commit", "--all", "-m", message])
    }

    pub fn push(&self) -> Result<()> {
        self.git(&["push"])
    }

    /// Stages everything, commits with `message` and pushes.
    pub fn commit_and_push(&self, message: &str) -> Result<()> {
        self.add_all()?;
        self.commit_all(message)?;
        self.push()
    }

    fn git(&self, args: &[&str]) -> Result<()> {
        self.runner.run(&self.repository, "git", args, self.context)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use testutils::*;

    #[test]
    fn format_command_quotes_arguments_with_spaces() {
        let command_line = format_command("git", &["commit", "--all", "-m", "merge version v1.10.0 from k8s"]);
        assert_eq!(command_line, "git commit --all -m \"merge version v1.10.0 from k8s\"");
    }

    #[test]
    fn git_open_missing_directory() {
        let runner = RecordingRunner::new();
        let context = dummy_sync_context();
        match Git::open(&runner, &context, Path::new("does-not-exist")) {
            Err(Error(ErrorKind::DirectoryNotFound(path), _)) => assert_eq!(path, PathBuf::from("does-not-exist")),
            _ => panic!("Opening a missing checkout should fail with DirectoryNotFound"),
        }
    }

    #[test]
    fn git_commit_and_push_runs_in_order() {
        with_default_test_directory(|test_directory| {
            let runner = RecordingRunner::new();
            let context = dummy_sync_context();
            let git = Git::open(&runner, &context, test_directory).unwrap();
            git.commit_and_push("merge latest").unwrap();
            assert_eq!(runner.recorded(), vec![
                "git add .".to_string(),
                "git commit --all -m \"merge latest\"".to_string(),
                "git push".to_string(),
            ]);
        });
    }

    #[test]
    fn git_commit_and_push_stops_on_failure() {
        with_default_test_directory(|test_directory| {
            let runner = RecordingRunner::failing_on("git commit");
            let context = dummy_sync_context();
            let git = Git::open(&runner, &context, test_directory).unwrap();
            match git.commit_and_push("merge latest") {
                Err(Error(ErrorKind::CommandFailed(command, _), _)) => assert_eq!(command.starts_with("git commit"), true),
                _ => panic!("A failing commit should surface as CommandFailed"),
            }
            assert_eq!(runner.recorded().contains(&"git push".to_string()), false);
        });
    }

    #[test]
    fn shell_runner_dry_run_does_not_run() {
        with_default_test_directory(|test_directory| {
            let context = dry_run_sync_context();
            let result = ShellRunner.run(test_directory, "does-not-exist-program", &[], &context);
            assert_eq!(result.is_ok(), true);
        });
    }

    #[test]
    fn shell_runner_missing_program() {
        with_default_test_directory(|test_directory| {
            let context = dummy_sync_context();
            let result = ShellRunner.run(test_directory, "does-not-exist-program", &[], &context);
            assert_eq!(result.is_err(), true);
        });
    }

    #[cfg(unix)]
    #[test]
    fn shell_runner_reports_exit_status() {
        with_default_test_directory(|test_directory| {
            let context = dummy_sync_context();
            assert_eq!(ShellRunner.run(test_directory, "true", &[], &context).is_ok(), true);
            match ShellRunner.run(test_directory, "false", &[], &context) {
                Err(Error(ErrorKind::CommandFailed(command, _), _)) => assert_eq!(command, "false"),
                _ => panic!("A non-zero exit should surface as CommandFailed"),
            }
        });
    }
}
