use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{ClientError, ClientResult};

/// Open/closed flag shared between a controller and whoever shows it.
///
/// Closing the scope does not cancel requests already in flight; it makes the
/// controller drop their results instead of writing into a view nobody is
/// looking at.
#[derive(Debug, Clone)]
pub struct ViewScope {
    open: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Call after every await, before touching view state.
    pub fn ensure_open(&self) -> ClientResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ClientError::ViewClosed)
        }
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_is_seen_by_clones() {
        let scope = ViewScope::new();
        let remote = scope.clone();
        assert!(scope.ensure_open().is_ok());

        remote.close();
        assert!(!scope.is_open());
        assert_eq!(scope.ensure_open(), Err(ClientError::ViewClosed));
    }
}
