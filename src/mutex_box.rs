use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug)]
struct Slot<T> {
    value: T,
    version: u64,
}

/// Shared latest value with change notification.
///
/// Writers go through [`open`](MutexBox::open) from sync or async code;
/// readers either take a copy or wait for a version newer than the one they
/// last saw.
#[derive(Debug)]
pub struct MutexBox<T> {
    inner: Arc<Mutex<Slot<T>>>,
    notify: Arc<Notify>,
}

impl<T> MutexBox<T> {
    pub fn new(value: T) -> MutexBox<T> {
        Self {
            inner: Arc::new(Mutex::new(Slot { value, version: 0 })),
            notify: Arc::new(Notify::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // a panicking writer leaves a whole value behind, keep serving it
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mutates the value in place and wakes every waiter.
    pub fn open<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let result = {
            let mut slot = self.lock();
            let result = f(&mut slot.value);
            slot.version += 1;
            result
        };
        self.notify.notify_waiters();
        result
    }

    pub fn set(&self, value: T) {
        self.open(|inner| *inner = value);
    }

    /// Number of writes so far.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Another handle to the same value.
    pub fn clone_handle(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            notify: Arc::clone(&self.notify),
        }
    }
}

impl<T> MutexBox<T>
where
    T: Clone,
{
    pub fn clone_inner(&self) -> T {
        self.lock().value.clone()
    }

    /// Waits until the version differs from `seen` and returns the value
    /// with its version.
    pub async fn changed(&self, seen: u64) -> (T, u64) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let slot = self.lock();
                if slot.version != seen {
                    return (slot.value.clone(), slot.version);
                }
            }
            notified.await;
        }
    }
}

impl<T: Default> Default for MutexBox<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
