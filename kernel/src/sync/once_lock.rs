//! A heap-free, write-once cell for global kernel state.
//!
//! This kernel never allocates, so initialization writes the value in
//! place inside a `spin::Mutex<Option<T>>` rather than behind a leaked
//! `Box`. Access after init is a lock acquisition rather than a raw
//! pointer load — uncontended in practice since the kernel is
//! single-hart and cooperative, but still the `unsafe`-free path through
//! a `static`.

use spin::Mutex;

pub struct OnceCell<T> {
    inner: Mutex<Option<T>>,
}

impl<T> OnceCell<T> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Initializes the cell. Panics if called twice.
    pub fn init(&self, value: T) {
        let mut guard = self.inner.lock();
        assert!(guard.is_none(), "OnceCell already initialized");
        *guard = Some(value);
    }

    /// Runs `f` with a reference to the contained value.
    ///
    /// Panics if the cell has not been initialized yet.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.lock();
        f(guard.as_ref().expect("OnceCell accessed before init"))
    }

    /// Runs `f` with a mutable reference to the contained value.
    ///
    /// Panics if the cell has not been initialized yet.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock();
        f(guard.as_mut().expect("OnceCell accessed before init"))
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().is_some()
    }
}

impl<T> Default for OnceCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_access_panics() {
        let cell: OnceCell<u32> = OnceCell::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cell.with(|v| *v)
        }));
        assert!(result.is_err());
    }

    #[test]
    fn init_then_read() {
        let cell: OnceCell<u32> = OnceCell::new();
        cell.init(42);
        assert_eq!(cell.with(|v| *v), 42);
    }

    #[test]
    #[should_panic(expected = "already initialized")]
    fn double_init_panics() {
        let cell: OnceCell<u32> = OnceCell::new();
        cell.init(1);
        cell.init(2);
    }
}
