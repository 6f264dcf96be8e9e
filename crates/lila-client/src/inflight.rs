use std::sync::atomic::{AtomicBool, Ordering};

/// Marks an operation as running until dropped. A second
/// [`try_start`](InFlight::try_start) on the same flag fails meanwhile.
#[derive(Debug)]
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    pub(crate) fn try_start(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
