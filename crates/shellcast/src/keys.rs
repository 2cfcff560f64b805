//! Scoped, prioritized key interception.
//!
//! A [`KeyInterceptors`] registry is created once by the host UI and passed
//! to whatever needs to claim key events. Registration returns an
//! [`InterceptorHandle`]; dropping the handle removes the interceptor.
//!
//! Handlers run on the dispatching thread and may register or drop
//! interceptors while a dispatch is in progress. Changes take effect for the
//! next dispatch, except that a removed interceptor is never called again.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Result of offering an event to an interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The event was handled; stop dispatching.
    Consumed,
    /// Not handled; offer it to the next interceptor.
    Ignored,
}

impl KeyOutcome {
    /// Whether the event was consumed.
    #[must_use]
    pub const fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed)
    }
}

type Predicate<E> = Rc<dyn Fn(&E) -> bool>;
type Handler<E> = Rc<RefCell<dyn FnMut(&E) -> KeyOutcome>>;

/// An interceptor waiting to be registered.
pub struct Interceptor<E> {
    priority: i32,
    scope: Option<String>,
    predicate: Option<Predicate<E>>,
    handler: Handler<E>,
}

impl<E: 'static> Interceptor<E> {
    /// Wrap a handler. Priority 0, active in every scope, no predicate.
    pub fn new(handler: impl FnMut(&E) -> KeyOutcome + 'static) -> Self {
        Self {
            priority: 0,
            scope: None,
            predicate: None,
            handler: Rc::new(RefCell::new(handler)),
        }
    }

    /// Higher priorities run first.
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Only run while the registry's current scope equals `scope`.
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Only run for events matching `predicate`.
    #[must_use]
    pub fn when(mut self, predicate: impl Fn(&E) -> bool + 'static) -> Self {
        self.predicate = Some(Rc::new(predicate));
        self
    }
}

impl<E> fmt::Debug for Interceptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("priority", &self.priority)
            .field("scope", &self.scope)
            .field("predicate", &self.predicate.is_some())
            .finish_non_exhaustive()
    }
}

struct Entry<E> {
    id: u64,
    priority: i32,
    scope: Option<String>,
    predicate: Option<Predicate<E>>,
    handler: Handler<E>,
}

impl<E> Entry<E> {
    fn active_in(&self, scope: Option<&str>) -> bool {
        self.scope.as_deref().is_none_or(|s| Some(s) == scope)
    }
}

struct Registry<E> {
    next_id: u64,
    scope: Option<String>,
    // Kept sorted: priority descending, then registration order.
    entries: Vec<Entry<E>>,
}

impl<E> Registry<E> {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    fn remove(&mut self, id: u64) {
        self.entries.retain(|e| e.id != id);
    }
}

/// Registry of key interceptors. Cloning shares the registry.
pub struct KeyInterceptors<E> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E> Clone for KeyInterceptors<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<E: 'static> Default for KeyInterceptors<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> KeyInterceptors<E> {
    /// Create an empty registry with no current scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                scope: None,
                entries: Vec::new(),
            })),
        }
    }

    /// Register an interceptor. It stays registered until the handle drops.
    #[must_use = "dropping the handle immediately deregisters the interceptor"]
    pub fn register(&self, interceptor: Interceptor<E>) -> InterceptorHandle {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;

        let position = registry
            .entries
            .iter()
            .position(|e| e.priority < interceptor.priority)
            .unwrap_or(registry.entries.len());
        registry.entries.insert(
            position,
            Entry {
                id,
                priority: interceptor.priority,
                scope: interceptor.scope,
                predicate: interceptor.predicate,
                handler: interceptor.handler,
            },
        );
        drop(registry);

        let weak: Weak<RefCell<Registry<E>>> = Rc::downgrade(&self.registry);
        InterceptorHandle {
            release: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    registry.borrow_mut().remove(id);
                }
            })),
        }
    }

    /// Set the current scope. `None` leaves only unscoped interceptors active.
    pub fn set_scope(&self, scope: Option<&str>) {
        self.registry.borrow_mut().scope = scope.map(str::to_string);
    }

    /// The current scope.
    #[must_use]
    pub fn scope(&self) -> Option<String> {
        self.registry.borrow().scope.clone()
    }

    /// Offer `event` to active interceptors, highest priority first, until
    /// one consumes it.
    pub fn dispatch(&self, event: &E) -> KeyOutcome {
        let candidates: Vec<(u64, Option<Predicate<E>>, Handler<E>)> = {
            let registry = self.registry.borrow();
            let scope = registry.scope.as_deref();
            registry
                .entries
                .iter()
                .filter(|e| e.active_in(scope))
                .map(|e| (e.id, e.predicate.clone(), Rc::clone(&e.handler)))
                .collect()
        };

        for (id, predicate, handler) in candidates {
            if !self.registry.borrow().contains(id) {
                continue;
            }
            if predicate.is_some_and(|p| !p(event)) {
                continue;
            }
            // A handler that re-dispatches from inside itself is skipped.
            let Ok(mut call) = handler.try_borrow_mut() else {
                continue;
            };
            if (&mut *call)(event).is_consumed() {
                return KeyOutcome::Consumed;
            }
        }
        KeyOutcome::Ignored
    }

    /// Number of registered interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    /// Whether no interceptors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> fmt::Debug for KeyInterceptors<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("KeyInterceptors")
            .field("scope", &registry.scope)
            .field("interceptors", &registry.entries.len())
            .finish()
    }
}

/// Keeps an interceptor registered. Dropping it deregisters.
pub struct InterceptorHandle {
    release: Option<Box<dyn FnOnce()>>,
}

impl InterceptorHandle {
    /// Deregister now.
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Keep the interceptor registered for the registry's lifetime.
    pub fn detach(mut self) {
        self.release = None;
    }
}

impl Drop for InterceptorHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for InterceptorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorHandle")
            .field("attached", &self.release.is_some())
            .finish()
    }
}
