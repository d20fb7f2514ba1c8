//! Work handle: a claimed work item that must be completed or failed.

/// A claimed work item. Move semantics: consumed by `complete()` or `fail()`.
///
/// If dropped without being consumed, logs a warning. The item then stays in
/// `processing` until an operator resets it.
#[derive(Debug)]
pub struct WorkHandle<T: Send + Sync> {
    item: Option<T>,
}

impl<T: Send + Sync> WorkHandle<T> {
    pub(crate) fn new(item: T) -> Self {
        Self { item: Some(item) }
    }

    /// The claimed item.
    pub fn item(&self) -> &T {
        match self.item.as_ref() {
            Some(item) => item,
            // Only `consume` takes the item, and it takes `self` by value.
            None => unreachable!("work handle used after consume"),
        }
    }

    /// Take the item out (called internally by complete/fail).
    pub(crate) fn consume(mut self) -> T {
        match self.item.take() {
            Some(item) => item,
            None => unreachable!("work handle consumed twice"),
        }
    }
}

impl<T: Send + Sync> Drop for WorkHandle<T> {
    fn drop(&mut self) {
        if self.item.is_some() {
            tracing::warn!("WorkHandle dropped without being completed or failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_returns_item() {
        let handle = WorkHandle::new(7);
        assert_eq!(*handle.item(), 7);
        assert_eq!(handle.consume(), 7);
    }

    #[test]
    fn test_debug_shows_item() {
        let handle = WorkHandle::new("doc-7");
        assert!(format!("{:?}", handle).contains("doc-7"));
        handle.consume();
    }
}
