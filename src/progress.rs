//! Progress reporting hook.
//!
//! Library code reports inserted rows and completed databases/targets through
//! a [`ProgressHook`]; the CLI turns those events into a progress bar.

/// What just happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    /// Rows or documents inserted since the previous event
    Rows(u64),
    /// A database finished materializing
    Database,
    /// A target finished, successfully or not
    Target,
}

/// One progress event
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent<'a> {
    pub target: &'a str,
    pub database: Option<&'a str>,
    pub kind: ProgressKind,
}

/// A callback invoked for every progress event.
pub struct ProgressHook {
    callback: Box<dyn Fn(&ProgressEvent<'_>)>,
}

impl ProgressHook {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&ProgressEvent<'_>) + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    pub fn emit(&self, event: &ProgressEvent<'_>) {
        (self.callback)(event);
    }
}

impl std::fmt::Debug for ProgressHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProgressHook")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_hook_receives_events() {
        let rows = Rc::new(Cell::new(0u64));
        let seen = rows.clone();
        let hook = ProgressHook::new(move |event| {
            if let ProgressKind::Rows(n) = event.kind {
                seen.set(seen.get() + n);
            }
        });

        for _ in 0..3 {
            hook.emit(&ProgressEvent {
                target: "postgres/plain",
                database: Some("pg_1"),
                kind: ProgressKind::Rows(250),
            });
        }
        assert_eq!(rows.get(), 750);
    }
}
