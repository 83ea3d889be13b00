use slab::Slab;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = Box<dyn FnMut(&T)>;
type Slots<T> = RefCell<Slab<Option<Callback<T>>>>;

/// Handle for a registered callback or other scoped resource. Releases it
/// when dropped.
#[must_use = "dropping a Subscription releases it immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn release(mut self) {
        if let Some(f) = self.release.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.release.take() {
            f();
        }
    }
}

/// Collects subscriptions so they can be released together on teardown.
#[derive(Default)]
pub struct Disposer {
    subscriptions: Vec<Subscription>,
}

impl Disposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release everything, most recent first. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        while let Some(sub) = self.subscriptions.pop() {
            sub.release();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Single-threaded callback registry.
///
/// Callbacks may drop their own (or another) subscription while being
/// invoked.
pub struct Listeners<T> {
    slots: Rc<Slots<T>>,
}

impl<T: 'static> Listeners<T> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slab::new())),
        }
    }

    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let key = self.slots.borrow_mut().insert(Some(Box::new(callback)));
        let weak: Weak<Slots<T>> = Rc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = weak.upgrade() {
                let mut slots = slots.borrow_mut();
                if slots.contains(key) {
                    slots.remove(key);
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Invoke every registered callback with `value`.
    pub fn emit(&self, value: &T) {
        let keys: Vec<usize> = self.slots.borrow().iter().map(|(key, _)| key).collect();
        for key in keys {
            let callback = self
                .slots
                .borrow_mut()
                .get_mut(key)
                .and_then(Option::take);
            let Some(mut callback) = callback else {
                continue;
            };
            callback(value);
            if let Some(slot) = self.slots.borrow_mut().get_mut(key) {
                if slot.is_none() {
                    *slot = Some(callback);
                }
            }
        }
    }
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}
