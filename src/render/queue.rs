//! Deferred draw queue
//!
//! Draw closures deferred here run at the end of the frame, after the scene
//! has drawn itself. The debug layer flushes last, so overlays sit on top
//! of everything; when the overlay is disabled its closures are dropped
//! unexecuted.

use std::cell::RefCell;

type DrawFn = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawLayer {
    Normal,
    Debug,
}

pub struct DrawQueue {
    normal: RefCell<Vec<DrawFn>>,
    debug: RefCell<Vec<DrawFn>>,
}

impl DrawQueue {
    pub fn new() -> Self {
        Self {
            normal: RefCell::new(Vec::new()),
            debug: RefCell::new(Vec::new()),
        }
    }

    pub fn defer(&self, layer: DrawLayer, draw: impl FnOnce() + 'static) {
        match layer {
            DrawLayer::Normal => self.normal.borrow_mut().push(Box::new(draw)),
            DrawLayer::Debug => self.debug.borrow_mut().push(Box::new(draw)),
        }
    }

    /// Run queued draws in order, normal layer first.
    pub fn flush(&self, include_debug: bool) {
        for draw in self.normal.borrow_mut().drain(..) {
            draw();
        }
        let mut debug = self.debug.borrow_mut();
        if include_debug {
            for draw in debug.drain(..) {
                draw();
            }
        } else {
            debug.clear();
        }
    }

    pub fn clear(&self) {
        self.normal.borrow_mut().clear();
        self.debug.borrow_mut().clear();
    }
}

impl Default for DrawQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;
    use std::rc::Rc;

    #[test]
    fn normal_flushes_before_debug() {
        let queue = DrawQueue::new();
        let log = Rc::new(StdRefCell::new(Vec::new()));

        {
            let log = Rc::clone(&log);
            queue.defer(DrawLayer::Debug, move || log.borrow_mut().push("debug"));
        }
        {
            let log = Rc::clone(&log);
            queue.defer(DrawLayer::Normal, move || log.borrow_mut().push("normal"));
        }

        queue.flush(true);
        assert_eq!(*log.borrow(), vec!["normal", "debug"]);
    }

    #[test]
    fn debug_layer_drops_when_disabled() {
        let queue = DrawQueue::new();
        let log = Rc::new(StdRefCell::new(Vec::new()));

        {
            let log = Rc::clone(&log);
            queue.defer(DrawLayer::Debug, move || log.borrow_mut().push("debug"));
        }
        queue.flush(false);
        assert!(log.borrow().is_empty());

        // And it does not linger for the next frame either
        queue.flush(true);
        assert!(log.borrow().is_empty());
    }
}
