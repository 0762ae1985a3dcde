use std::fmt;
use std::sync::Arc;

/// Callback body. The argument is shared by every callback of one invocation.
pub type HookFn<T> = Arc<dyn Fn(&mut T) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookMode {
    /// Runs to completion inside `invoke`, in registration order.
    Sync,
    /// Runs after the current turn on an owned copy; errors are only logged.
    Deferred,
}

impl fmt::Display for HookMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookMode::Sync => "sync",
            HookMode::Deferred => "deferred",
        })
    }
}

/// Summary of one `invoke` call. Failures never propagate; this is the only
/// trace of them besides the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeReport {
    pub ran: usize,
    pub failed: usize,
    pub deferred: usize,
}

impl InvokeReport {
    pub fn all_ok(&self) -> bool {
        self.failed == 0
    }
}
