use crate::entity::Entity;
use crate::registry::Registry;
use std::cell::RefMut;
use std::rc::Rc;

/// Callback invoked with the registry and the entity a change applies to.
pub type Listener = Rc<dyn Fn(&Registry, Entity)>;

/// Token identifying one connected listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalKind {
    Construct,
    Update,
    Destroy,
}

/// Ordered list of listeners for one kind of event.
#[derive(Default)]
pub struct Signal {
    listeners: Vec<(Connection, Listener)>,
    next_connection: u64,
}

impl Signal {
    pub fn connect<F>(&mut self, listener: F) -> Connection
    where
        F: Fn(&Registry, Entity) + 'static,
    {
        let connection = Connection(self.next_connection);
        self.next_connection += 1;
        self.listeners.push((connection, Rc::new(listener)));
        connection
    }

    pub fn disconnect(&mut self, connection: Connection) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(c, _)| *c != connection);
        self.listeners.len() != before
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Copies the listener list so it can be invoked after the pool that
    /// owns this signal has been released.
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.listeners.iter().map(|(_, l)| l.clone()).collect()
    }
}

/// The construct, update and destroy signals of one pool.
#[derive(Default)]
pub struct Signals {
    pub construct: Signal,
    pub update: Signal,
    pub destroy: Signal,
}

impl Signals {
    pub fn get(&self, kind: SignalKind) -> &Signal {
        match kind {
            SignalKind::Construct => &self.construct,
            SignalKind::Update => &self.update,
            SignalKind::Destroy => &self.destroy,
        }
    }

    pub fn get_mut(&mut self, kind: SignalKind) -> &mut Signal {
        match kind {
            SignalKind::Construct => &mut self.construct,
            SignalKind::Update => &mut self.update,
            SignalKind::Destroy => &mut self.destroy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.construct.is_empty() && self.update.is_empty() && self.destroy.is_empty()
    }
}

/// Subscription handle for one signal of one pool, as returned by
/// `Registry::on_construct` and friends.
pub struct Sink<'a> {
    signal: RefMut<'a, Signal>,
}

impl<'a> Sink<'a> {
    pub(crate) fn new(signal: RefMut<'a, Signal>) -> Self {
        Sink { signal }
    }

    pub fn connect<F>(&mut self, listener: F) -> Connection
    where
        F: Fn(&Registry, Entity) + 'static,
    {
        self.signal.connect(listener)
    }

    pub fn disconnect(&mut self, connection: Connection) -> bool {
        self.signal.disconnect(connection)
    }

    pub fn len(&self) -> usize {
        self.signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    pub fn clear(&mut self) {
        self.signal.clear();
    }
}
