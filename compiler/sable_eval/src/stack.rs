//! Dynamic call stack for backtrace reporting.
//!
//! One stack exists per compile pass. The root environment creates it and
//! every node reaches the identical handle through `Environment::stack`, so
//! an error raised anywhere can render where evaluation currently is.
//! Recursion limits are the evaluator's concern, not this module's.

// Rc is the intentional implementation detail of SharedStack
#![expect(
    clippy::disallowed_types,
    reason = "Rc is the implementation of SharedStack"
)]

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// What kind of construct a stack frame represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// A stylesheet being evaluated directly.
    Base,
    /// An `@import`ed stylesheet.
    Import,
    /// A mixin invocation.
    Mixin,
    /// A function invocation.
    Function,
}

/// One entry on the call stack.
#[derive(Clone, Debug)]
pub struct Frame {
    filename: Option<Rc<str>>,
    line: usize,
    kind: FrameKind,
    name: Option<Rc<str>>,
}

impl Frame {
    fn new(filename: Option<Rc<str>>, line: usize, kind: FrameKind, name: Option<Rc<str>>) -> Self {
        Frame {
            filename,
            line,
            kind,
            name,
        }
    }

    /// Source file of the construct, if known.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Source line of the construct.
    pub fn line(&self) -> usize {
        self.line
    }

    /// What the frame represents.
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Mixin/function name, for those frame kinds.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} of {}",
            self.line,
            self.filename.as_deref().unwrap_or("an unknown file")
        )?;
        match (self.kind, self.name.as_deref()) {
            (FrameKind::Mixin, Some(name)) => write!(f, ", in mixin `{name}`"),
            (FrameKind::Function, Some(name)) => write!(f, ", in function `{name}`"),
            _ => Ok(()),
        }
    }
}

/// The frame list. Use through [`SharedStack`].
#[derive(Default)]
pub struct Stack {
    frames: Vec<Frame>,
}

impl Stack {
    /// An empty stack.
    pub fn new() -> Self {
        Stack::default()
    }

    /// Number of frames currently on the stack.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The frames, outermost first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl fmt::Display for Stack {
    /// Backtrace rendering, innermost frame first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().rev().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let origin = if i == 0 { "on" } else { "from" };
            write!(f, "{origin} {frame}")?;
        }
        Ok(())
    }
}

/// Shared handle to the per-compile call stack.
///
/// This newtype enforces that all stack allocations go through
/// [`SharedStack::new`]; the root environment constructor is the one place
/// that calls it.
#[derive(Clone, Default)]
pub struct SharedStack(Rc<RefCell<Stack>>);

/// Pops the pushed frame when dropped, including during unwinding.
struct FrameGuard<'a>(&'a SharedStack);

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.0 .0.borrow_mut().frames.pop();
    }
}

impl SharedStack {
    /// Create the stack for a compile pass.
    pub fn new() -> Self {
        SharedStack(Rc::new(RefCell::new(Stack::new())))
    }

    /// Whether two handles refer to the same stack.
    pub fn ptr_eq(&self, other: &SharedStack) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of frames currently on the stack.
    pub fn depth(&self) -> usize {
        self.0.borrow().depth()
    }

    /// Render the current backtrace.
    pub fn backtrace(&self) -> String {
        self.0.borrow().to_string()
    }

    /// Run `f` with a base-stylesheet frame on the stack.
    pub fn with_base<R>(&self, filename: Option<Rc<str>>, line: usize, f: impl FnOnce() -> R) -> R {
        self.with_frame(Frame::new(filename, line, FrameKind::Base, None), f)
    }

    /// Run `f` with an `@import` frame on the stack.
    pub fn with_import<R>(
        &self,
        filename: Option<Rc<str>>,
        line: usize,
        f: impl FnOnce() -> R,
    ) -> R {
        self.with_frame(Frame::new(filename, line, FrameKind::Import, None), f)
    }

    /// Run `f` with a mixin-invocation frame on the stack.
    pub fn with_mixin<R>(
        &self,
        filename: Option<Rc<str>>,
        line: usize,
        name: impl Into<Rc<str>>,
        f: impl FnOnce() -> R,
    ) -> R {
        self.with_frame(
            Frame::new(filename, line, FrameKind::Mixin, Some(name.into())),
            f,
        )
    }

    /// Run `f` with a function-invocation frame on the stack.
    pub fn with_function<R>(
        &self,
        filename: Option<Rc<str>>,
        line: usize,
        name: impl Into<Rc<str>>,
        f: impl FnOnce() -> R,
    ) -> R {
        self.with_frame(
            Frame::new(filename, line, FrameKind::Function, Some(name.into())),
            f,
        )
    }

    /// Push `frame`, run `f`, pop on every exit path.
    fn with_frame<R>(&self, frame: Frame, f: impl FnOnce() -> R) -> R {
        tracing::trace!(kind = ?frame.kind, line = frame.line, "push stack frame");
        self.0.borrow_mut().frames.push(frame);
        let _guard = FrameGuard(self);
        f()
    }
}

impl fmt::Debug for SharedStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStack")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(name: &str) -> Option<Rc<str>> {
        Some(Rc::from(name))
    }

    #[test]
    fn with_frame_restores_depth() {
        let stack = SharedStack::new();
        assert_eq!(stack.depth(), 0);

        let depth_inside = stack.with_mixin(file("screen.sable"), 3, "button", || stack.depth());

        assert_eq!(depth_inside, 1);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn nested_frames_stack_up() {
        let stack = SharedStack::new();
        stack.with_base(file("screen.sable"), 1, || {
            stack.with_mixin(file("screen.sable"), 10, "card", || {
                stack.with_function(file("_helpers.sable"), 4, "shade", || {
                    assert_eq!(stack.depth(), 3);
                });
            });
        });
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn backtrace_lists_innermost_first() {
        let stack = SharedStack::new();
        let backtrace = stack.with_base(file("screen.sable"), 12, || {
            stack.with_mixin(file("screen.sable"), 3, "button", || stack.backtrace())
        });

        assert_eq!(
            backtrace,
            "on line 3 of screen.sable, in mixin `button`\nfrom line 12 of screen.sable"
        );
    }

    #[test]
    fn unknown_file_renders_placeholder() {
        let stack = SharedStack::new();
        let backtrace = stack.with_base(None, 1, || stack.backtrace());
        assert_eq!(backtrace, "on line 1 of an unknown file");
    }

    #[test]
    fn clones_share_the_same_frames() {
        let stack = SharedStack::new();
        let alias = stack.clone();
        assert!(stack.ptr_eq(&alias));

        stack.with_base(file("screen.sable"), 1, || {
            assert_eq!(alias.depth(), 1);
        });
    }
}
