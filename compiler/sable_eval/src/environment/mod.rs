//! Environment frames.
//!
//! A [`Frame`] is an insertion-ordered list of bindings plus an optional
//! context (enclosing) frame. Lookup walks the context chain outward and
//! takes the first binding with the requested name. Frames are shared by
//! the closures that capture them, so they are reference counted.

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use sable_ir::Name;

use crate::errors::{variable_not_found, EvalResult};
use crate::value::{release, Garbage};
use crate::Value;

/// Bindings of one frame.
#[derive(Default)]
pub struct FrameData {
    bindings: Vec<(Name, Value)>,
    context: Option<Frame>,
}

impl Drop for FrameData {
    // Bindings and context are released through the value worklist; a
    // frame can end a chain of closures that each capture the next frame.
    fn drop(&mut self) {
        let bindings = mem::take(&mut self.bindings);
        let context = self.context.take();
        if bindings.is_empty() && context.is_none() {
            return;
        }
        let mut pending: Vec<Garbage> = bindings
            .into_iter()
            .map(|(_, value)| Garbage::Value(value))
            .collect();
        pending.extend(context.map(Garbage::Frame));
        release(pending);
    }
}

/// Shared handle to a frame.
#[repr(transparent)]
#[derive(Clone)]
pub struct Frame(Rc<RefCell<FrameData>>);

impl Frame {
    /// A frame without context.
    pub fn root() -> Frame {
        Frame::with_bindings(None, Vec::new())
    }

    /// An empty frame enclosed by `self`.
    pub fn child(&self) -> Frame {
        Frame::with_bindings(Some(self.clone()), Vec::new())
    }

    /// A frame binding `names[i]` to `values[i]`, enclosed by `parent`.
    /// Extra names or values are ignored.
    pub fn bind_new_frame(
        parent: &Frame,
        names: impl IntoIterator<Item = Name>,
        values: impl IntoIterator<Item = Value>,
    ) -> Frame {
        let bindings = names.into_iter().zip(values).collect();
        Frame::with_bindings(Some(parent.clone()), bindings)
    }

    pub(crate) fn with_bindings(context: Option<Frame>, bindings: Vec<(Name, Value)>) -> Frame {
        Frame(Rc::new(RefCell::new(FrameData { bindings, context })))
    }

    pub fn context(&self) -> Option<Frame> {
        self.0.borrow().context.clone()
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: Name) -> EvalResult {
        self.try_lookup(name)
            .ok_or_else(|| variable_not_found(name.as_str()))
    }

    pub fn try_lookup(&self, name: Name) -> Option<Value> {
        let mut frame = self.clone();
        loop {
            let next = {
                let data = frame.0.borrow();
                if let Some((_, value)) = data.bindings.iter().find(|(n, _)| *n == name) {
                    return Some(value.clone());
                }
                data.context.clone()?
            };
            frame = next;
        }
    }

    /// Bind `name` in this frame, overwriting an existing binding here.
    /// Returns `true` when a new binding was appended.
    pub fn define(&self, name: Name, value: Value) -> bool {
        let mut data = self.0.borrow_mut();
        if let Some(slot) = data.bindings.iter_mut().find(|(n, _)| *n == name) {
            // Drop the old value after the borrow ends.
            let old = mem::replace(&mut slot.1, value);
            drop(data);
            drop(old);
            false
        } else {
            data.bindings.push((name, value));
            true
        }
    }

    /// Whether this frame itself binds `name`.
    pub fn binds(&self, name: Name) -> bool {
        self.0.borrow().bindings.iter().any(|(n, _)| *n == name)
    }

    /// Snapshot of this frame's bindings in slot order.
    pub(crate) fn bindings(&self) -> Vec<(Name, Value)> {
        self.0.borrow().bindings.clone()
    }

    /// Binding names of this frame in slot order.
    pub fn names(&self) -> Vec<Name> {
        self.0.borrow().bindings.iter().map(|(n, _)| *n).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().bindings.is_empty()
    }

    /// Binding at `index` of the frame `depth` contexts out.
    pub fn slot(&self, depth: usize, index: usize) -> Option<(Name, Value)> {
        let mut frame = self.clone();
        for _ in 0..depth {
            let next = frame.0.borrow().context.clone()?;
            frame = next;
        }
        let data = frame.0.borrow();
        data.bindings.get(index).cloned()
    }

    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Drop every binding of this frame.
    pub(crate) fn clear(&self) {
        let bindings = mem::take(&mut self.0.borrow_mut().bindings);
        drop(bindings);
    }

    /// Bindings and context of a frame nobody else holds.
    pub(crate) fn into_parts(self) -> Option<(Vec<(Name, Value)>, Option<Frame>)> {
        let mut data = Rc::try_unwrap(self.0).ok()?.into_inner();
        Some((mem::take(&mut data.bindings), data.context.take()))
    }

    fn downgrade(&self) -> Weak<RefCell<FrameData>> {
        Rc::downgrade(&self.0)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("names", &self.names())
            .field("has_context", &self.0.borrow().context.is_some())
            .finish()
    }
}

/// Weak registry of the frames an evaluator created.
///
/// Closures stored in the frames they capture form reference cycles;
/// [`FrameTracker::release`] breaks them by clearing every frame still alive.
#[derive(Default)]
pub(crate) struct FrameTracker {
    frames: Vec<Weak<RefCell<FrameData>>>,
    /// Live count after the last prune.
    live: usize,
}

impl FrameTracker {
    pub(crate) fn track(&mut self, frame: &Frame) {
        self.frames.push(frame.downgrade());
        if self.frames.len() >= (self.live * 2).max(64) {
            self.frames.retain(|weak| weak.strong_count() > 0);
            self.live = self.frames.len();
        }
    }

    /// Clear the bindings of every tracked frame still alive.
    pub(crate) fn release(&mut self) {
        let frames = mem::take(&mut self.frames);
        self.live = 0;
        tracing::debug!(tracked = frames.len(), "releasing evaluator frames");
        for weak in frames {
            if let Some(rc) = weak.upgrade() {
                Frame(rc).clear();
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }
}
