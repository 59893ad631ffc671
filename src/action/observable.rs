//! Typed field with change notification.

use std::fmt;

type Observer<T> = Box<dyn FnMut(&T, &T) + Send>;

/// A value plus the observers that hear about its changes.
///
/// `set` notifies observers with `(old, new)` before returning, and only when
/// the new value differs from the current one.
pub struct Observable<T> {
    value: T,
    observers: Vec<Observer<T>>,
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            observers: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Register an observer called as `observer(old, new)`.
    pub fn subscribe(&mut self, observer: impl FnMut(&T, &T) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }
}

impl<T: PartialEq> Observable<T> {
    /// Store `value`, returning whether it changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        let old = std::mem::replace(&mut self.value, value);
        for observer in &mut self.observers {
            observer(&old, &self.value);
        }
        true
    }
}

impl<T: Copy> Observable<T> {
    pub fn value(&self) -> T {
        self.value
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("observers", &self.observers.len())
            .finish()
    }
}
