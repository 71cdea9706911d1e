//! Lazily initialized, resettable model handles.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ChatmoodError, Result};

type Loader<M> = Box<dyn Fn() -> Result<Arc<M>> + Send + Sync>;

/// Holder for an expensive classifier resource.
///
/// The loader runs at most once until [`reset`](ModelSlot::reset) is called.
/// Every caller of [`ensure_initialized`](ModelSlot::ensure_initialized)
/// receives the same shared handle, which is read-only from then on.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use chatmood::classify::ModelSlot;
///
/// let loads = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&loads);
/// let slot: ModelSlot<String> = ModelSlot::new("greeting", move || {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(Arc::new("hello".to_string()))
/// });
///
/// slot.ensure_initialized()?;
/// slot.ensure_initialized()?;
/// assert_eq!(loads.load(Ordering::SeqCst), 1);
///
/// slot.reset();
/// slot.ensure_initialized()?;
/// assert_eq!(loads.load(Ordering::SeqCst), 2);
/// # Ok::<(), chatmood::ChatmoodError>(())
/// ```
pub struct ModelSlot<M: ?Sized + Send + Sync> {
    name: &'static str,
    loader: Loader<M>,
    handle: Mutex<Option<Arc<M>>>,
}

impl<M: ?Sized + Send + Sync + 'static> ModelSlot<M> {
    /// Creates an empty slot; nothing is loaded until first use.
    pub fn new<F>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<M>> + Send + Sync + 'static,
    {
        Self {
            name,
            loader: Box::new(loader),
            handle: Mutex::new(None),
        }
    }

    /// Creates a slot around an already constructed resource.
    ///
    /// After a reset the same resource is handed out again.
    pub fn from_handle(name: &'static str, handle: Arc<M>) -> Self {
        let reload = Arc::clone(&handle);
        Self {
            name,
            loader: Box::new(move || Ok(Arc::clone(&reload))),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Returns the cached handle, loading it first if the slot is empty.
    ///
    /// Loader failures surface as [`ChatmoodError::ResourceInit`] and leave
    /// the slot empty.
    pub fn ensure_initialized(&self) -> Result<Arc<M>> {
        let mut guard = self.lock();
        if let Some(handle) = guard.as_ref() {
            return Ok(Arc::clone(handle));
        }

        tracing::info!(resource = self.name, "Loading classifier resource");
        let handle = (self.loader)().map_err(|e| match e {
            ChatmoodError::ResourceInit { .. } => e,
            other => ChatmoodError::resource_init(self.name, other.to_string()),
        })?;
        tracing::info!(resource = self.name, "Classifier resource ready");

        *guard = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Drops the cached handle; the next use reloads it.
    pub fn reset(&self) {
        if self.lock().take().is_some() {
            tracing::debug!(resource = self.name, "Classifier resource reset");
        }
    }

    /// Returns `true` if a handle is cached.
    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<M>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<M: ?Sized + Send + Sync + 'static> fmt::Debug for ModelSlot<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSlot")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_slot(loads: &Arc<AtomicUsize>) -> ModelSlot<usize> {
        let counter = Arc::clone(loads);
        ModelSlot::new("counter", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(n))
        })
    }

    #[test]
    fn test_lazy_until_first_use() {
        let loads = Arc::new(AtomicUsize::new(0));
        let slot = counting_slot(&loads);
        assert!(!slot.is_initialized());
        assert_eq!(loads.load(Ordering::SeqCst), 0);

        slot.ensure_initialized().unwrap();
        assert!(slot.is_initialized());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handle_is_shared() {
        let loads = Arc::new(AtomicUsize::new(0));
        let slot = counting_slot(&loads);
        let a = slot.ensure_initialized().unwrap();
        let b = slot.ensure_initialized().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_reset_reloads_exactly_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let slot = counting_slot(&loads);
        let first = slot.ensure_initialized().unwrap();

        slot.reset();
        assert!(!slot.is_initialized());
        let second = slot.ensure_initialized().unwrap();
        slot.ensure_initialized().unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(*first, 0);
        assert_eq!(*second, 1);
    }

    #[test]
    fn test_failure_is_resource_init_and_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let slot: ModelSlot<usize> = ModelSlot::new("broken", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ChatmoodError::inference("weights missing"))
        });

        let err = slot.ensure_initialized().unwrap_err();
        assert!(err.is_resource_init());
        assert!(err.to_string().contains("broken"));
        assert!(!slot.is_initialized());

        assert!(slot.ensure_initialized().is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_from_handle_survives_reset() {
        let slot = ModelSlot::from_handle("fixed", Arc::new(7usize));
        assert!(slot.is_initialized());
        slot.reset();
        assert_eq!(*slot.ensure_initialized().unwrap(), 7);
    }

    #[test]
    fn test_concurrent_callers_load_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let slot = Arc::new(counting_slot(&loads));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || *slot.ensure_initialized().unwrap())
            })
            .collect();

        for t in threads {
            assert_eq!(t.join().unwrap(), 0);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
