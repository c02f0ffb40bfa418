//! Typed event bus
//!
//! Decouples the simulation from its observers: particles, audio, camera
//! shake, the message log. Subscribers register per event kind and are
//! invoked synchronously in subscription order. `dispatch` fans out against
//! a snapshot of the subscriber list, so a callback that unsubscribes
//! another subscriber mid-dispatch does not affect the current fan-out.
//!
//! Simulation code that runs while the world or player is mutably borrowed
//! uses `queue` instead; the scene loop `flush`es at phase boundaries where
//! no borrows are held.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use macroquad::math::Vec2;

use crate::physics::Aabb;
use crate::world::{BlockId, BlockKind};

/// Everything that can happen in the game that someone else may care about.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// A mining tick landed on a block.
    BlockMined { kind: BlockKind, position: Vec2 },
    /// A block shook loose and started to fall.
    BlockStartFall { id: BlockId, position: Vec2 },
    /// A falling block came to rest on the grid.
    BlockLanded { id: BlockId, position: Vec2 },
    /// A block's durability reached zero.
    BlockDestroyed { kind: BlockKind, bounds: Aabb },
    /// The player touched an interactable block (chest, exit).
    BlockClicked { kind: BlockKind, position: Vec2 },
    PlayerJump,
    PlayerWalk,
    PlayerLand { position: Vec2 },
    PlayerDeath,
    PlayerStartMining { position: Vec2 },
    /// A line for the on-screen message log.
    LogMessage { message: String },
    LanternShake { magnitude: Vec2, duration: f32 },
    /// The lantern's glow stepped to a new size index.
    LanternSizeChange { size_index: usize },
}

/// Subscription key: one variant per `GameEvent` variant, payload-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BlockMined,
    BlockStartFall,
    BlockLanded,
    BlockDestroyed,
    BlockClicked,
    PlayerJump,
    PlayerWalk,
    PlayerLand,
    PlayerDeath,
    PlayerStartMining,
    LogMessage,
    LanternShake,
    LanternSizeChange,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::BlockMined { .. } => EventKind::BlockMined,
            GameEvent::BlockStartFall { .. } => EventKind::BlockStartFall,
            GameEvent::BlockLanded { .. } => EventKind::BlockLanded,
            GameEvent::BlockDestroyed { .. } => EventKind::BlockDestroyed,
            GameEvent::BlockClicked { .. } => EventKind::BlockClicked,
            GameEvent::PlayerJump => EventKind::PlayerJump,
            GameEvent::PlayerWalk => EventKind::PlayerWalk,
            GameEvent::PlayerLand { .. } => EventKind::PlayerLand,
            GameEvent::PlayerDeath => EventKind::PlayerDeath,
            GameEvent::PlayerStartMining { .. } => EventKind::PlayerStartMining,
            GameEvent::LogMessage { .. } => EventKind::LogMessage,
            GameEvent::LanternShake { .. } => EventKind::LanternShake,
            GameEvent::LanternSizeChange { .. } => EventKind::LanternSizeChange,
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe. Ids are monotonic
/// and never reused within a bus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Callback = Rc<RefCell<dyn FnMut(&GameEvent)>>;

struct Subscriber {
    id: SubscriptionId,
    kind: EventKind,
    callback: Callback,
}

#[derive(Default)]
struct Inner {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    pending: VecDeque<GameEvent>,
}

pub struct EventBus {
    inner: RefCell<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { inner: RefCell::new(Inner::default()) }
    }

    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl FnMut(&GameEvent) + 'static,
    ) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            kind,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    /// Unknown ids are ignored, so double-unsubscribe is harmless.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.borrow_mut().subscribers.retain(|s| s.id != id);
    }

    /// Invoke every matching subscriber, in subscription order, right now.
    pub fn dispatch(&self, event: &GameEvent) {
        let snapshot: Vec<Callback> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .filter(|s| s.kind == event.kind())
            .map(|s| Rc::clone(&s.callback))
            .collect();
        for callback in snapshot {
            (callback.borrow_mut())(event);
        }
    }

    /// Defer an event until the next `flush`. Safe to call while the world
    /// or player is mutably borrowed.
    pub fn queue(&self, event: GameEvent) {
        self.inner.borrow_mut().pending.push_back(event);
    }

    /// Dispatch queued events in FIFO order. Events queued by subscribers
    /// during the flush are dispatched in the same pass.
    pub fn flush(&self) {
        loop {
            let event = self.inner.borrow_mut().pending.pop_front();
            match event {
                Some(event) => self.dispatch(&event),
                None => break,
            }
        }
    }

    /// Drop every subscription and queued event. Called on scene switch.
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.clear();
        inner.pending.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_subscriber(bus: &EventBus, kind: EventKind, log: &Rc<RefCell<Vec<u32>>>, tag: u32) -> SubscriptionId {
        let log = Rc::clone(log);
        bus.subscribe(kind, move |_| log.borrow_mut().push(tag))
    }

    #[test]
    fn dispatch_fans_out_in_subscription_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        log_subscriber(&bus, EventKind::PlayerJump, &log, 1);
        log_subscriber(&bus, EventKind::PlayerDeath, &log, 9);
        log_subscriber(&bus, EventKind::PlayerJump, &log, 2);
        log_subscriber(&bus, EventKind::PlayerJump, &log, 3);

        bus.dispatch(&GameEvent::PlayerJump);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn unsubscribe_during_dispatch_does_not_affect_current_fanout() {
        let bus = Rc::new(EventBus::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        // Second subscriber's id, filled in below
        let victim = Rc::new(RefCell::new(None));

        {
            let log = Rc::clone(&log);
            let bus2 = Rc::clone(&bus);
            let victim = Rc::clone(&victim);
            bus.subscribe(EventKind::PlayerJump, move |_| {
                log.borrow_mut().push(1);
                if let Some(id) = *victim.borrow() {
                    bus2.unsubscribe(id);
                }
            });
        }
        let id = log_subscriber(&bus, EventKind::PlayerJump, &log, 2);
        *victim.borrow_mut() = Some(id);

        // Both run this dispatch; only the first survives to the next
        bus.dispatch(&GameEvent::PlayerJump);
        assert_eq!(*log.borrow(), vec![1, 2]);

        bus.dispatch(&GameEvent::PlayerJump);
        assert_eq!(*log.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn queued_events_flush_in_fifo_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = Rc::clone(&log);
            bus.subscribe(EventKind::PlayerJump, move |_| log.borrow_mut().push(1));
        }
        {
            let log = Rc::clone(&log);
            bus.subscribe(EventKind::PlayerDeath, move |_| log.borrow_mut().push(2));
        }

        bus.queue(GameEvent::PlayerJump);
        bus.queue(GameEvent::PlayerDeath);
        bus.queue(GameEvent::PlayerJump);
        assert!(log.borrow().is_empty());

        bus.flush();
        assert_eq!(*log.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn reset_drops_subscribers_and_pending() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        log_subscriber(&bus, EventKind::PlayerJump, &log, 1);
        bus.queue(GameEvent::PlayerJump);

        bus.reset();
        bus.flush();
        bus.dispatch(&GameEvent::PlayerJump);
        assert!(log.borrow().is_empty());
    }
}
