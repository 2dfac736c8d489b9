//! Per-database extension state
//!
//! Components that must exist once per database instance (the version oracle
//! above all) are created lazily on first use and live as long as the
//! database. Entries are keyed by type; there is no teardown.

use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Extension = Arc<dyn Any + Send + Sync>;

/// Type-keyed registry of lazily created singletons
#[derive(Clone, Default)]
pub struct DatabaseExtensions {
    entries: Arc<Mutex<HashMap<TypeId, Extension>>>,
}

impl DatabaseExtensions {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The `T` registered for this database, created with `init` on first use
    ///
    /// `init` runs at most once per type, under the registry lock.
    pub fn get_or_insert_with<T, F>(&self, init: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| Arc::clone(entry).downcast::<T>().ok())
        {
            return existing;
        }
        let value = Arc::new(init());
        entries.insert(TypeId::of::<T>(), Arc::clone(&value) as Extension);
        value
    }

    /// Fallible variant of [`get_or_insert_with`](Self::get_or_insert_with);
    /// nothing is registered when `init` fails
    pub fn get_or_try_insert_with<T, E, F>(&self, init: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, E>,
    {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| Arc::clone(entry).downcast::<T>().ok())
        {
            return Ok(existing);
        }
        let value = Arc::new(init()?);
        entries.insert(TypeId::of::<T>(), Arc::clone(&value) as Extension);
        Ok(value)
    }

    /// The `T` registered for this database, if any
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.entries
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|entry| Arc::clone(entry).downcast::<T>().ok())
    }
}

impl std::fmt::Debug for DatabaseExtensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseExtensions")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Counter(usize);

    #[test]
    fn init_runs_once_per_type() {
        let extensions = DatabaseExtensions::new();
        let calls = AtomicUsize::new(0);

        let first = extensions.get_or_insert_with(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Counter(7)
        });
        let second = extensions.get_or_insert_with(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Counter(9)
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.0, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_init_registers_nothing() {
        let extensions = DatabaseExtensions::new();
        let result: Result<Arc<Counter>, &str> =
            extensions.get_or_try_insert_with(|| Err("offline"));
        assert!(result.is_err());
        assert!(extensions.get::<Counter>().is_none());
    }

    #[test]
    fn separate_databases_do_not_share() {
        let a = DatabaseExtensions::new();
        let b = DatabaseExtensions::new();
        let from_a = a.get_or_insert_with(|| Counter(1));
        let from_b = b.get_or_insert_with(|| Counter(2));
        assert!(!Arc::ptr_eq(&from_a, &from_b));
    }
}
