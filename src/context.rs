/// Settings shared by every filesystem and command operation of a run.
#[derive(Clone, Debug, Default)]
pub struct SyncContext {
    /// Log what would happen without writing, moving, deleting or running anything.
    pub dry_run: bool
}
