//! The call-frame stack.
//!
//! A frame is the minimum state needed to route an inbound message back to
//! the invocation that caused it: the `to` address of the invocation (or
//! `None` for a `GETAPI` call, which has no contract address) and the host
//! context handle whose callbacks answer that invocation's messages.
//!
//! Frame identity is never observed outside the push/pop pair that brackets
//! one invocation, so a plain `Vec` is sufficient.

use crate::host::HostContext;
use crate::message::Address;
use std::sync::Arc;

/// One pending invocation on a proxy's connection.
pub struct Frame {
    /// The invocation's `to` address; `None` for a `GETAPI` frame.
    pub addr: Option<Address>,
    /// The host context that owns this invocation's callbacks.
    pub ctx: Arc<dyn HostContext>,
}

impl Frame {
    pub fn new(addr: Option<Address>, ctx: Arc<dyn HostContext>) -> Self {
        Self { addr, ctx }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame").field("addr", &self.addr).finish_non_exhaustive()
    }
}

/// LIFO stack of pending invocations on one proxy connection.
///
/// Bounded only by host call depth: no artificial cap is imposed here.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Removes and returns the top frame, if any.
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Returns the top frame without removing it.
    pub fn peek(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tests::NullContext;

    fn ctx() -> Arc<dyn HostContext> {
        Arc::new(NullContext)
    }

    #[test]
    fn lifo_order() {
        let mut stack = FrameStack::new();
        assert!(stack.is_empty());
        stack.push(Frame::new(Some(Address::new("a1")), ctx()));
        stack.push(Frame::new(Some(Address::new("a2")), ctx()));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek().unwrap().addr, Some(Address::new("a2")));
        let top = stack.pop().unwrap();
        assert_eq!(top.addr, Some(Address::new("a2")));
        assert_eq!(stack.peek().unwrap().addr, Some(Address::new("a1")));
        assert!(stack.pop().is_some());
        assert!(stack.is_empty());
        assert!(stack.pop().is_none());
    }

    #[test]
    fn get_api_frame_has_no_address() {
        let mut stack = FrameStack::new();
        stack.push(Frame::new(None, ctx()));
        assert_eq!(stack.peek().unwrap().addr, None);
    }
}
