/*!
 Memoized address to contact name resolution.

 An export run looks the same addresses up over and over; the cache remembers
 every answer, including "no name found", for the lifetime of one run and is
 never persisted.
*/

use std::collections::HashMap;

use tracing::warn;

use crate::store::ContactLookup;

/// A run-scoped cache of address to resolved display name
#[derive(Debug, Default)]
pub struct DisplayNameCache {
    names: HashMap<String, Option<String>>,
}

impl DisplayNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an address to a display name.
    ///
    /// An empty address resolves to `None` immediately, without a lookup or a
    /// cache write. A cached answer, including a cached `None`, is returned
    /// without querying the store. A lookup failure resolves to `None` and is
    /// not cached, so a later record may retry.
    pub fn resolve<S: ContactLookup + ?Sized>(
        &mut self,
        store: &S,
        address: &str,
    ) -> Option<String> {
        if address.is_empty() {
            return None;
        }
        if let Some(cached) = self.names.get(address) {
            return cached.clone();
        }
        match store.display_name(address) {
            Ok(name) => {
                self.names.insert(address.to_string(), name.clone());
                name
            }
            Err(why) => {
                warn!("Display name lookup failed for {address}: {why}");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::{
        error::store::StoreError,
        store::ContactLookup,
        util::names::DisplayNameCache,
    };

    /// Counts lookups so the tests can observe caching
    struct CountingLookup {
        lookups: Cell<usize>,
    }

    impl CountingLookup {
        fn new() -> Self {
            CountingLookup {
                lookups: Cell::new(0),
            }
        }
    }

    impl ContactLookup for CountingLookup {
        fn display_name(&self, address: &str) -> Result<Option<String>, StoreError> {
            self.lookups.set(self.lookups.get() + 1);
            Ok(match address {
                "+15550001111" => Some("Jess Example".to_string()),
                _ => None,
            })
        }
    }

    #[test]
    fn empty_address_is_never_looked_up() {
        let store = CountingLookup::new();
        let mut cache = DisplayNameCache::new();
        assert_eq!(cache.resolve(&store, ""), None);
        assert_eq!(store.lookups.get(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn hits_do_not_requery() {
        let store = CountingLookup::new();
        let mut cache = DisplayNameCache::new();
        assert_eq!(
            cache.resolve(&store, "+15550001111").as_deref(),
            Some("Jess Example")
        );
        assert_eq!(
            cache.resolve(&store, "+15550001111").as_deref(),
            Some("Jess Example")
        );
        assert_eq!(store.lookups.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_names_are_cached_too() {
        let store = CountingLookup::new();
        let mut cache = DisplayNameCache::new();
        assert_eq!(cache.resolve(&store, "+15559999999"), None);
        assert_eq!(cache.resolve(&store, "+15559999999"), None);
        assert_eq!(store.lookups.get(), 1);
    }
}
