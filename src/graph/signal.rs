//! Synchronous signal/observer notification
//!
//! A [`Signal`] keeps an ordered list of observers, each with one callback.
//! Emission calls the callbacks in connection order on the calling thread.
//! Either side can go away first: dropping a signal detaches it from its
//! observers and dropping an observer disconnects it from every signal.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

fn next_link_id() -> u64 {
    NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed)
}

/// Type-erased view of a signal used by observers for teardown
trait SignalLink {
    fn signal_id(&self) -> u64;
    fn drop_observer(&self, observer_id: u64);
}

struct ObserverCore {
    id: u64,
    signals: RefCell<Vec<Weak<dyn SignalLink>>>,
}

impl ObserverCore {
    fn attach(&self, signal: Weak<dyn SignalLink>, signal_id: u64) {
        let mut signals = self.signals.borrow_mut();
        signals.retain(|s| s.strong_count() > 0);
        let known = signals
            .iter()
            .any(|s| s.upgrade().map_or(false, |s| s.signal_id() == signal_id));
        if !known {
            signals.push(signal);
        }
    }

    fn detach(&self, signal_id: u64) {
        self.signals
            .borrow_mut()
            .retain(|s| s.upgrade().map_or(false, |s| s.signal_id() != signal_id));
    }

    fn live_signals(&self) -> Vec<Rc<dyn SignalLink>> {
        self.signals.borrow().iter().filter_map(Weak::upgrade).collect()
    }
}

/// Receiving side of a connection.
///
/// Dropping the observer disconnects it from every signal it was connected to.
pub struct SignalObserver {
    core: Rc<ObserverCore>,
}

impl SignalObserver {
    /// Create an observer with no connections
    pub fn new() -> Self {
        Self {
            core: Rc::new(ObserverCore { id: next_link_id(), signals: RefCell::new(Vec::new()) }),
        }
    }

    /// Process-unique observer id
    pub fn id(&self) -> u64 {
        self.core.id
    }

    /// Number of live signals this observer is connected to
    pub fn connected_signal_count(&self) -> usize {
        self.core.live_signals().len()
    }

    /// Disconnect from every signal
    pub fn disconnect_all(&self) {
        let signals = self.core.live_signals();
        self.core.signals.borrow_mut().clear();
        for signal in signals {
            signal.drop_observer(self.core.id);
        }
    }
}

impl Default for SignalObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SignalObserver {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

impl fmt::Debug for SignalObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalObserver")
            .field("id", &self.core.id)
            .field("signals", &self.connected_signal_count())
            .finish()
    }
}

struct Connection<A> {
    observer_id: u64,
    observer: Weak<ObserverCore>,
    callback: Rc<dyn Fn(&A)>,
}

struct SignalCore<A> {
    id: u64,
    connections: RefCell<Vec<Connection<A>>>,
}

impl<A: 'static> SignalLink for SignalCore<A> {
    fn signal_id(&self) -> u64 {
        self.id
    }

    fn drop_observer(&self, observer_id: u64) {
        // Callbacks are dropped after the borrow ends since they may own the signal.
        let removed: Vec<Connection<A>> = {
            let mut connections = self.connections.borrow_mut();
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *connections)
                .into_iter()
                .partition(|c| c.observer_id == observer_id);
            *connections = kept;
            removed
        };
        drop(removed);
    }
}

/// Sending side of a connection, carrying arguments of type `A`.
pub struct Signal<A: 'static> {
    core: Rc<SignalCore<A>>,
}

impl<A: 'static> Signal<A> {
    /// Create a signal with no observers
    pub fn new() -> Self {
        Self {
            core: Rc::new(SignalCore { id: next_link_id(), connections: RefCell::new(Vec::new()) }),
        }
    }

    /// Connect `observer`, replacing its previous callback if already connected
    pub fn connect(&self, observer: &SignalObserver, callback: impl Fn(&A) + 'static) {
        let callback: Rc<dyn Fn(&A)> = Rc::new(callback);
        let replaced = {
            let mut connections = self.core.connections.borrow_mut();
            match connections.iter_mut().find(|c| c.observer_id == observer.id()) {
                Some(existing) => Some(std::mem::replace(&mut existing.callback, callback)),
                None => {
                    connections.push(Connection {
                        observer_id: observer.id(),
                        observer: Rc::downgrade(&observer.core),
                        callback,
                    });
                    None
                }
            }
        };
        drop(replaced);
        let link: Weak<dyn SignalLink> = Rc::downgrade(&self.core) as Weak<dyn SignalLink>;
        observer.core.attach(link, self.core.id);
    }

    /// Remove `observer` from this signal
    pub fn disconnect(&self, observer: &SignalObserver) {
        self.core.drop_observer(observer.id());
        observer.core.detach(self.core.id);
    }

    /// Remove every observer from this signal
    pub fn disconnect_all(&self) {
        let connections = std::mem::take(&mut *self.core.connections.borrow_mut());
        for connection in connections {
            if let Some(observer) = connection.observer.upgrade() {
                observer.detach(self.core.id);
            }
        }
    }

    /// True if `observer` is connected
    pub fn is_connected(&self, observer: &SignalObserver) -> bool {
        self.is_connected_id(observer.id())
    }

    fn is_connected_id(&self, observer_id: u64) -> bool {
        self.core.connections.borrow().iter().any(|c| c.observer_id == observer_id)
    }

    /// Number of connected observers
    pub fn observer_count(&self) -> usize {
        self.core.connections.borrow().len()
    }

    /// Invoke every connected callback in connection order.
    ///
    /// Callbacks may connect or disconnect observers; an observer disconnected
    /// by an earlier callback in the same emission is skipped.
    pub fn emit(&self, args: &A) {
        let snapshot: Vec<(u64, Rc<dyn Fn(&A)>)> = self
            .core
            .connections
            .borrow()
            .iter()
            .filter(|c| c.observer.strong_count() > 0)
            .map(|c| (c.observer_id, Rc::clone(&c.callback)))
            .collect();

        for (observer_id, callback) in snapshot {
            if self.is_connected_id(observer_id) {
                callback(args);
            }
        }
    }
}

impl<A: 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> Drop for Signal<A> {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

impl<A: 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.core.id)
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_emit_in_connection_order() {
        let signal: Signal<i32> = Signal::new();
        let first = SignalObserver::new();
        let second = SignalObserver::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        signal.connect(&first, move |v| l.borrow_mut().push(("first", *v)));
        let l = log.clone();
        signal.connect(&second, move |v| l.borrow_mut().push(("second", *v)));

        signal.emit(&7);
        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_reconnect_replaces_callback() {
        // Goal: one observer holds at most one callback per signal
        let signal: Signal<()> = Signal::new();
        let observer = SignalObserver::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        signal.connect(&observer, move |_| h.set(h.get() + 1));
        let h = hits.clone();
        signal.connect(&observer, move |_| h.set(h.get() + 10));

        signal.emit(&());
        assert_eq!(hits.get(), 10);
        assert_eq!(signal.observer_count(), 1);
        assert_eq!(observer.connected_signal_count(), 1);
    }

    #[test]
    fn test_disconnect_both_sides() {
        let signal: Signal<()> = Signal::new();
        let observer = SignalObserver::new();
        signal.connect(&observer, |_| {});
        assert!(signal.is_connected(&observer));

        signal.disconnect(&observer);
        assert!(!signal.is_connected(&observer));
        assert_eq!(observer.connected_signal_count(), 0);
    }

    #[test]
    fn test_observer_drop_disconnects() {
        let signal: Signal<()> = Signal::new();
        {
            let observer = SignalObserver::new();
            signal.connect(&observer, |_| panic!("dropped observer must not be called"));
            assert_eq!(signal.observer_count(), 1);
        }
        assert_eq!(signal.observer_count(), 0);
        signal.emit(&());
    }

    #[test]
    fn test_signal_drop_detaches_observer() {
        let observer = SignalObserver::new();
        let a: Signal<u8> = Signal::new();
        let b: Signal<u8> = Signal::new();
        a.connect(&observer, |_| {});
        b.connect(&observer, |_| {});
        assert_eq!(observer.connected_signal_count(), 2);

        drop(a);
        assert_eq!(observer.connected_signal_count(), 1);
        observer.disconnect_all();
        assert_eq!(b.observer_count(), 0);
    }

    #[test]
    fn test_callback_disconnecting_later_observer() {
        // Goal: an observer disconnected mid-emission is not invoked
        let signal = Rc::new(Signal::<()>::new());
        let first = SignalObserver::new();
        let second = Rc::new(SignalObserver::new());
        let called = Rc::new(Cell::new(false));

        let s = signal.clone();
        let target = second.clone();
        signal.connect(&first, move |_| s.disconnect(&target));
        let c = called.clone();
        signal.connect(&second, move |_| c.set(true));

        signal.emit(&());
        assert!(!called.get());
        assert_eq!(signal.observer_count(), 1);
    }
}
