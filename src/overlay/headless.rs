//! In-process collaborators for driving an overlay without a host page.
//!
//! Each type is a cheap clone over shared state, so the embedder keeps one
//! clone to steer the host while the overlay owns the other.

use crate::overlay::backend::{ChangeSource, HostElement, SubscriptionId, Timer, TimerId, WatchTarget};
use crate::overlay::model::HostRect;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct SharedRect(Rc<Cell<HostRect>>);

impl SharedRect {
    pub fn new(rect: HostRect) -> Self {
        Self(Rc::new(Cell::new(rect)))
    }

    pub fn set(&self, rect: HostRect) {
        self.0.set(rect);
    }

    pub fn get(&self) -> HostRect {
        self.0.get()
    }
}

impl HostElement for SharedRect {
    fn rect(&self) -> HostRect {
        self.0.get()
    }
}

#[derive(Debug, Default)]
struct ChangesInner {
    next_id: u64,
    active: Vec<(SubscriptionId, WatchTarget)>,
}

#[derive(Debug, Clone, Default)]
pub struct ManualChanges(Rc<RefCell<ChangesInner>>);

impl ManualChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Vec<(SubscriptionId, WatchTarget)> {
        self.0.borrow().active.clone()
    }

    pub fn subscription_for(&self, target: WatchTarget) -> Option<SubscriptionId> {
        self.0
            .borrow()
            .active
            .iter()
            .find(|(_, watched)| *watched == target)
            .map(|(id, _)| *id)
    }
}

impl ChangeSource for ManualChanges {
    fn subscribe(&mut self, target: WatchTarget) -> SubscriptionId {
        let mut inner = self.0.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.active.push((id, target));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.0.borrow_mut().active.retain(|(active, _)| *active != id);
    }
}

#[derive(Debug, Default)]
struct TimerInner {
    next_id: u64,
    active: Vec<(TimerId, Duration)>,
}

#[derive(Debug, Clone, Default)]
pub struct ManualTimer(Rc<RefCell<TimerInner>>);

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Vec<(TimerId, Duration)> {
        self.0.borrow().active.clone()
    }

    pub fn first(&self) -> Option<TimerId> {
        self.0.borrow().active.first().map(|(id, _)| *id)
    }
}

impl Timer for ManualTimer {
    fn every(&mut self, interval: Duration) -> TimerId {
        let mut inner = self.0.borrow_mut();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        inner.active.push((id, interval));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.0.borrow_mut().active.retain(|(active, _)| *active != id);
    }
}
