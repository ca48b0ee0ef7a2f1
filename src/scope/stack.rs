//! Scope stack with guard-based release.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::record::Identity;
use crate::scope::frame::ScopeFrame;

#[derive(Debug, Default)]
struct StackInner {
    next_id: u64,
    frames: Vec<(u64, ScopeFrame)>,
    identity: Option<Identity>,
}

/// Stack of scope frames owned by one logical operation.
///
/// Cloning shares the same stack.
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    inner: Arc<Mutex<StackInner>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack carrying the authenticated subject of the operation.
    pub fn with_identity(identity: Option<Identity>) -> Self {
        let stack = Self::default();
        stack.lock().identity = identity;
        stack
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().identity.clone()
    }

    /// Push a frame. The frame stays active until the returned guard is
    /// released or dropped.
    #[must_use = "the frame is released as soon as the guard is dropped"]
    pub fn push(&self, frame: ScopeFrame) -> ScopeGuard {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.frames.push((id, frame));
        ScopeGuard {
            stack: self.clone(),
            id,
            released: false,
        }
    }

    /// Visit the frames active right now, outermost first.
    pub fn for_each_active<F: FnMut(&ScopeFrame)>(&self, mut visitor: F) {
        let frames: Vec<ScopeFrame> = self.lock().frames.iter().map(|(_, f)| f.clone()).collect();
        for frame in &frames {
            visitor(frame);
        }
    }

    pub fn depth(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    fn release(&self, id: u64) {
        self.lock().frames.retain(|(frame_id, _)| *frame_id != id);
    }

    fn lock(&self) -> MutexGuard<'_, StackInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one pushed frame.
///
/// Releasing removes exactly that frame, wherever it sits in the stack.
/// Releasing twice is a no-op.
#[derive(Debug)]
pub struct ScopeGuard {
    stack: ScopeStack,
    id: u64,
    released: bool,
}

impl ScopeGuard {
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stack.release(self.id);
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(stack: &ScopeStack) -> Vec<String> {
        let mut out = Vec::new();
        stack.for_each_active(|frame| {
            if let ScopeFrame::Label(l) = frame {
                out.push(l.clone());
            }
        });
        out
    }

    #[test]
    fn test_lifo_release_empties_stack() {
        let stack = ScopeStack::new();
        let mut a = stack.push(ScopeFrame::label("a"));
        let mut b = stack.push(ScopeFrame::label("b"));
        let mut c = stack.push(ScopeFrame::label("c"));
        assert_eq!(labels(&stack), vec!["a", "b", "c"]);

        c.release();
        b.release();
        a.release();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_out_of_order_release_leaves_no_stale_frames() {
        let stack = ScopeStack::new();
        let mut a = stack.push(ScopeFrame::label("a"));
        let b = stack.push(ScopeFrame::label("b"));
        let mut c = stack.push(ScopeFrame::label("c"));

        a.release();
        assert_eq!(labels(&stack), vec!["b", "c"]);
        drop(b);
        assert_eq!(labels(&stack), vec!["c"]);
        c.release();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_double_release_is_idempotent() {
        let stack = ScopeStack::new();
        let _outer = stack.push(ScopeFrame::label("outer"));
        let mut inner = stack.push(ScopeFrame::label("inner"));
        inner.release();
        inner.release();
        drop(inner);
        assert_eq!(labels(&stack), vec!["outer"]);
    }

    #[test]
    fn test_release_on_early_return() {
        fn failing(stack: &ScopeStack) -> Result<(), &'static str> {
            let _guard = stack.push(ScopeFrame::label("work"));
            Err("failed")
        }

        let stack = ScopeStack::new();
        assert!(failing(&stack).is_err());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_visitor_sees_current_stack() {
        let stack = ScopeStack::new();
        let _a = stack.push(ScopeFrame::label("a"));
        assert_eq!(labels(&stack), vec!["a"]);
        let _b = stack.push(ScopeFrame::label("b"));
        assert_eq!(labels(&stack), vec!["a", "b"]);
    }
}
