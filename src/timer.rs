//! Scheduled tasks
//!
//! One-shot delays and repeating intervals, driven by the simulation clock
//! rather than wall time, so they pause with the game and stay deterministic
//! under the fixed timestep. Creators keep the returned handle and cancel it
//! on teardown; `reset` drops everything at scene switches.

use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

enum Task {
    Once(Option<Box<dyn FnOnce()>>),
    Repeating(Box<dyn FnMut()>),
}

struct Entry {
    handle: TimerHandle,
    period: f32,
    elapsed: f32,
    task: Task,
    finished: bool,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    // Cancels requested while `update` has the entries checked out
    cancel_requests: Vec<TimerHandle>,
    next_id: u64,
}

pub struct Timers {
    inner: RefCell<Inner>,
}

impl Timers {
    pub fn new() -> Self {
        Self { inner: RefCell::new(Inner::default()) }
    }

    /// Run `task` once after `delay` seconds of simulation time.
    pub fn schedule_once(&self, delay: f32, task: impl FnOnce() + 'static) -> TimerHandle {
        self.push(delay, Task::Once(Some(Box::new(task))))
    }

    /// Run `task` every `interval` seconds until cancelled. A large update
    /// step fires the task once per elapsed interval.
    pub fn schedule_repeating(&self, interval: f32, task: impl FnMut() + 'static) -> TimerHandle {
        self.push(interval, Task::Repeating(Box::new(task)))
    }

    fn push(&self, period: f32, task: Task) -> TimerHandle {
        let mut inner = self.inner.borrow_mut();
        let handle = TimerHandle(inner.next_id);
        inner.next_id += 1;
        inner.entries.push(Entry {
            handle,
            period: period.max(0.0),
            elapsed: 0.0,
            task,
            finished: false,
        });
        handle
    }

    /// Cancel a timer. Unknown or already-fired handles are ignored.
    pub fn cancel(&self, handle: TimerHandle) {
        let mut inner = self.inner.borrow_mut();
        if let Some(entry) = inner.entries.iter_mut().find(|e| e.handle == handle) {
            entry.finished = true;
        } else {
            inner.cancel_requests.push(handle);
        }
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.inner
            .borrow()
            .entries
            .iter()
            .any(|e| e.handle == handle && !e.finished)
    }

    /// Advance all timers. Callbacks run here and may schedule or cancel
    /// timers freely, including their own.
    pub fn update(&self, dt: f32) {
        let mut entries = std::mem::take(&mut self.inner.borrow_mut().entries);

        for entry in &mut entries {
            if entry.finished || self.cancel_requested(entry.handle) {
                entry.finished = true;
                continue;
            }
            entry.elapsed += dt;
            match &mut entry.task {
                Task::Once(task) => {
                    if entry.elapsed >= entry.period {
                        entry.finished = true;
                        if let Some(task) = task.take() {
                            task();
                        }
                    }
                }
                Task::Repeating(task) => {
                    while entry.elapsed >= entry.period {
                        entry.elapsed -= entry.period;
                        task();
                        if self.cancel_requested(entry.handle) {
                            entry.finished = true;
                            break;
                        }
                        // Zero-period guard
                        if entry.period <= 0.0 {
                            break;
                        }
                    }
                }
            }
        }

        let mut inner = self.inner.borrow_mut();
        let requests = std::mem::take(&mut inner.cancel_requests);
        let scheduled = std::mem::take(&mut inner.entries);
        entries.retain(|e| !e.finished && !requests.contains(&e.handle));
        entries.extend(
            scheduled
                .into_iter()
                .filter(|e| !requests.contains(&e.handle)),
        );
        inner.entries = entries;
    }

    fn cancel_requested(&self, handle: TimerHandle) -> bool {
        self.inner.borrow().cancel_requests.contains(&handle)
    }

    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.entries.clear();
        inner.cancel_requests.clear();
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}
