use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative cancel flag. Cloning shares the same
/// underlying flag, so the host can hold one handle and hand clones to
/// every dispatched layer.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// A closure view suitable for `stk_solid::compute_layer`'s `cancel`
    /// parameter, which takes `&dyn Fn() -> bool` rather than this type
    /// directly so `stk-solid` carries no dependency on this crate.
    pub fn as_poll(&self) -> impl Fn() -> bool + '_ {
        move || self.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_the_flag() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!a.is_cancelled());
        b.cancel();
        assert!(a.is_cancelled());
    }
}
