// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Depth-first traversal of a bound instance.
//!
//! Arrays expand into their repetitions and nested structs into their
//! members, in pre-order. Each step resolves against the buffer, so dynamic
//! counts are read as the walk reaches them. Iterators are cheap to clone
//! and [`Traversal::restart`] rewinds them.

use crate::codec::access::{child_index, ElementAccess, ElementHandle};
use crate::codec::CodecIndex;
use crate::error::Result;

#[derive(Debug, Clone)]
struct Frame {
    parent: CodecIndex,
    next: usize,
    count: usize,
    array: bool,
}

/// Lazy pre-order walk over the elements below the root.
#[derive(Debug)]
pub struct Traversal<'a, A> {
    access: &'a A,
    stack: Vec<Frame>,
    leaves_only: bool,
    started: bool,
    done: bool,
}

impl<A> Clone for Traversal<'_, A> {
    fn clone(&self) -> Self {
        Self {
            access: self.access,
            stack: self.stack.clone(),
            leaves_only: self.leaves_only,
            started: self.started,
            done: self.done,
        }
    }
}

/// Every element: struct members, whole arrays and their repetitions.
pub fn elements<A: ElementAccess>(access: &A) -> Traversal<'_, A> {
    Traversal::new(access, false)
}

/// Terminal scalar elements only, in the flat leaf numbering order.
pub fn leaves<A: ElementAccess>(access: &A) -> Traversal<'_, A> {
    Traversal::new(access, true)
}

impl<'a, A: ElementAccess> Traversal<'a, A> {
    fn new(access: &'a A, leaves_only: bool) -> Self {
        Self {
            access,
            stack: Vec::new(),
            leaves_only,
            started: false,
            done: false,
        }
    }

    /// Rewind to the first element.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.started = false;
        self.done = false;
    }

    fn fail<T>(&mut self, err: crate::error::CodecError) -> Option<Result<T>> {
        self.done = true;
        self.stack.clear();
        Some(Err(err))
    }
}

impl<'a, A: ElementAccess> Iterator for Traversal<'a, A> {
    type Item = Result<ElementHandle<'a, A>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            self.stack.push(Frame {
                parent: CodecIndex::root(),
                next: 0,
                count: self.access.layout().len(),
                array: false,
            });
        }
        loop {
            let Some(frame) = self.stack.last_mut() else {
                self.done = true;
                return None;
            };
            if frame.next >= frame.count {
                self.stack.pop();
                continue;
            }
            let index = child_index(&frame.parent, frame.array, frame.next);
            frame.next += 1;

            let (leaf, count, array) = match self.access.resolve(&index) {
                Ok(r) => (r.is_leaf(), r.child_count(), r.addresses_array()),
                Err(e) => return self.fail(e),
            };
            if count > 0 {
                self.stack.push(Frame {
                    parent: index.clone(),
                    next: 0,
                    count,
                    array,
                });
            }
            if leaf || !self.leaves_only {
                return Some(Ok(ElementHandle::new(self.access, index)));
            }
        }
    }
}
