//! Provider decorator backed by a session store

use crate::provider::TelemetryProvider;
use crate::session::{Session, SessionKind};
use crate::store::{SessionStore, StoreKey};
use crate::{Error, Result};
use tracing::{debug, warn};

/// Serves sessions from `store` when present and loads them from `inner`
/// otherwise, storing what it loads
///
/// Schedules are passed through uncached. A failure to store a freshly
/// loaded session is logged and the session is still returned.
#[derive(Debug)]
pub struct CachedProvider<P, S> {
    inner: P,
    store: S,
}

impl<P: TelemetryProvider, S: SessionStore> CachedProvider<P, S> {
    pub fn new(inner: P, store: S) -> Self {
        Self { inner, store }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (P, S) {
        (self.inner, self.store)
    }
}

impl<P: TelemetryProvider, S: SessionStore> TelemetryProvider for CachedProvider<P, S> {
    fn event_names(&self, year: u16) -> Result<Vec<String>> {
        self.inner.event_names(year)
    }

    fn load_session(&self, year: u16, event: &str, kind: SessionKind) -> Result<Session> {
        let key = StoreKey::new(year, event, kind);
        if let Some(session) = self.store.get(&key)? {
            debug!(key = %key, "session served from store");
            return Ok(session);
        }

        let session = self.inner.load_session(year, event, kind)?;
        match self.store.put(key.clone(), session.clone()) {
            Ok(()) => debug!(key = %key, "session loaded and stored"),
            // another writer stored it first; either copy is the same session
            Err(Error::StoreConflict(_)) => debug!(key = %key, "session already stored"),
            Err(e) => warn!(key = %key, error = %e, "failed to store session"),
        }
        Ok(session)
    }
}
