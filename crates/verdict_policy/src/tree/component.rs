//! Cached validity shared by all node kinds.

use once_cell::sync::OnceCell;
use verdict_core::Status;

/// Validation verdict computed on first use
///
/// Racing first uses may both compute the verdict; the first stored one
/// wins and both computations agree.
#[derive(Debug, Clone, Default)]
pub(crate) struct Validity(OnceCell<Status>);

impl Validity {
    /// Cached verdict, computing it with `check` on first use
    pub(crate) fn get_or_check(&self, check: impl FnOnce() -> Status) -> Status {
        self.0.get_or_init(check).clone()
    }

    /// Override the verdict
    pub(crate) fn set(&mut self, status: Status) {
        self.0 = OnceCell::with_value(status);
    }

    /// Forget the verdict so the next use recomputes it
    pub(crate) fn reset(&mut self) {
        self.0 = OnceCell::new();
    }
}
