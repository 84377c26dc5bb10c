use context::SyncContext;
use copier::CopyTask;
use error::*;
use layout::{DirMapping, Layout};
use mover::merge_move;
use paths::*;
use rewrite::rewrite_imports;
use rule::SuffixRule;
use vcs::{CommandRunner, Git};

/// Source extensions copied into the vendor tree, one copy pass each.
pub const VENDOR_EXTENSIONS: [&str; 6] = [".go", ".h", ".c", ".cgo", ".cpp", ".s"];

/// Only Go sources move between the scheduler fork and the main codebase.
pub const SCHEDULER_EXTENSION: &str = ".go";

const FORK_UPSTREAM_BRANCH: &str = "k8s";
const FORK_MAIN_BRANCH: &str = "master";

// Operator workflow for scheduler changes:
// 1. update_scheduler pulls a new upstream version into the fork and starts the merge
// 2. fix merge conflicts in the fork
// 3. push the fork's master branch
// 4. copy_sched_to_main copies the fork into the main codebase and rewrites imports
// 5. fix the build in the main codebase and commit it
// 6. copy_main_to_sched copies the main codebase back to the fork's master branch
pub struct Synchronizer<'a> {
    layout: &'a Layout,
    runner: &'a dyn CommandRunner,
    context: &'a SyncContext,
}

impl<'a> Synchronizer<'a> {
    pub fn new(layout: &'a Layout, runner: &'a dyn CommandRunner, context: &'a SyncContext) -> Synchronizer<'a> {
        Synchronizer { layout, runner, context }
    }

    /// Pulls the upstream checkout and checks out `revision`.
    pub fn checkout_upstream(&self, revision: &str) -> Result<()> {
        let git = Git::open(self.runner, self.context, &self.layout.upstream)?;
        git.pull()?;
        git.checkout(revision)
    }

    fn checkout_fork(&self, branch: &str) -> Result<Git<'a>> {
        let git = Git::open(self.runner, self.context, &self.layout.fork)?;
        git.checkout(branch)?;
        git.pull()?;
        Ok(git)
    }

    /// Replaces the vendor directory with the upstream tree at `revision`.
    ///
    /// The upstream's own `vendor/` and `staging/src/<namespace>/` trees are
    /// merged into the top of the vendor directory so that every package sits
    /// at its import path.
    pub fn update_vendor(&self, revision: &str) -> Result<()> {
        self.checkout_upstream(revision)?;

        let vendor = self.layout.vendor_dir();
        remove_directory(&vendor, self.context.dry_run)?;

        let vendored_upstream = self.layout.vendored_upstream();
        for &extension in VENDOR_EXTENSIONS.iter() {
            let copied = CopyTask::new(self.layout.upstream.clone(), vendored_upstream.clone())
                .with_suffix(Some(extension))
                .execute(self.context)?;
            debug!("Copied {} {} entries", copied.len(), extension);
        }

        merge_move(&vendored_upstream.join("vendor"), &vendor, self.context)?;

        let staging = vendored_upstream.join("staging").join("src").join(&self.layout.namespace);
        merge_move(&staging, &vendor.join(&self.layout.namespace), self.context)?;
        if !self.context.dry_run {
            prune_empty_directories(&staging, &vendored_upstream)?;
        }

        info!("Vendor directory {} updated to {}", vendor.to_string_lossy(), revision);
        Ok(())
    }

    /// Copies the upstream scheduler at `revision` into the fork and starts merging it into master.
    ///
    /// Merge conflicts are left for the operator to fix and push.
    pub fn update_scheduler(&self, revision: &str) -> Result<()> {
        self.checkout_upstream(revision)?;
        let fork = self.checkout_fork(FORK_UPSTREAM_BRANCH)?;

        self.replace_directories(&self.layout.upstream_to_fork())?;
        fork.commit_and_push(&format!("merge version {} from {}", revision, FORK_UPSTREAM_BRANCH))?;

        fork.checkout(FORK_MAIN_BRANCH)?;
        fork.pull_from("origin", FORK_UPSTREAM_BRANCH)
    }

    /// Copies the fork's scheduler into the main codebase and points its imports there.
    pub fn copy_sched_to_main(&self) -> Result<()> {
        self.replace_directories(&self.layout.fork_to_main())?;

        let rewritten = rewrite_imports(&self.layout.main_scheduler_dir(), &SuffixRule::new(SCHEDULER_EXTENSION),
                                        &self.layout.import_rewrites(), self.context)?;
        info!("Rewrote imports in {} files", rewritten.len());
        Ok(())
    }

    /// Copies the main codebase's scheduler back to the fork's master branch and pushes it.
    pub fn copy_main_to_sched(&self) -> Result<()> {
        let fork = self.checkout_fork(FORK_MAIN_BRANCH)?;

        let reversed: Vec<DirMapping> = self.layout.fork_to_main().iter().map(DirMapping::reversed).collect();
        self.replace_directories(&reversed)?;

        fork.commit_and_push("merge latest from main codebase")
    }

    /// Deletes each destination and copies the Go sources of its source into it.
    ///
    /// Every source is checked before anything is deleted.
    fn replace_directories(&self, mappings: &[DirMapping]) -> Result<()> {
        for mapping in mappings {
            if !mapping.source.is_dir() {
                bail!(ErrorKind::DirectoryNotFound(mapping.source.clone()));
            }
        }

        for mapping in mappings {
            remove_directory(&mapping.destination, self.context.dry_run)?;
            CopyTask::new(mapping.source.clone(), mapping.destination.clone())
                .with_suffix(Some(SCHEDULER_EXTENSION))
                .execute(self.context)?;
        }
        Ok(())
    }
}
