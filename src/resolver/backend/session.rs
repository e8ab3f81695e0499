// Session lifecycle
//
// One live metadata session at a time, keyed by the credential that
// built it. The slot sits behind an async mutex so concurrent callers
// serialize through (re)creation instead of racing duplicate sessions.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::resolver::backend::{MetadataSession, SessionFactory};
use crate::resolver::models::{ClientVariant, Credential};

struct SessionSlot {
    credential: Option<Credential>,
    session: Arc<dyn MetadataSession>,
}

pub struct SessionManager {
    factory: Arc<dyn SessionFactory>,
    slot: Mutex<Option<SessionSlot>>,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            slot: Mutex::new(None),
        }
    }

    /// Returns the live session when the credential still matches,
    /// otherwise signs the old one out (best effort) and builds a fresh
    /// one. Creation failure leaves the slot empty and returns `None`
    /// so callers can fall back to credential-free paths.
    pub async fn ensure_session(
        &self,
        credential: Option<&Credential>,
        variant: ClientVariant,
    ) -> Option<Arc<dyn MetadataSession>> {
        let mut slot = self.slot.lock().await;

        if let Some(current) = slot.as_ref() {
            if current.credential.as_ref() == credential {
                return Some(Arc::clone(&current.session));
            }
            debug!(factory = self.factory.name(), "credential changed, replacing session");
            if let Err(e) = current.session.sign_out().await {
                debug!("sign-out of stale session failed: {}", e);
            }
            *slot = None;
        }

        match self.factory.create(credential, variant).await {
            Ok(session) => {
                info!(
                    factory = self.factory.name(),
                    authenticated = credential.is_some(),
                    "metadata session ready"
                );
                *slot = Some(SessionSlot {
                    credential: credential.cloned(),
                    session: Arc::clone(&session),
                });
                Some(session)
            }
            Err(e) => {
                warn!(factory = self.factory.name(), "session creation failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::errors::SourceError;
    use crate::resolver::models::{PlaylistInfo, TrackInfo};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeSession {
        signed_out: AtomicUsize,
    }

    #[async_trait]
    impl MetadataSession for FakeSession {
        async fn search(&self, _q: &str, _l: usize) -> Result<Vec<TrackInfo>, SourceError> {
            Ok(Vec::new())
        }
        async fn video_info(&self, id: &str) -> Result<TrackInfo, SourceError> {
            Err(SourceError::NotFound(id.to_string()))
        }
        async fn playlist(&self, id: &str) -> Result<PlaylistInfo, SourceError> {
            Err(SourceError::NotFound(id.to_string()))
        }
        async fn related(&self, _id: &str, _l: usize) -> Result<Vec<TrackInfo>, SourceError> {
            Ok(Vec::new())
        }
        async fn sign_out(&self) -> Result<(), SourceError> {
            self.signed_out.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CountingFactory {
        created: AtomicUsize,
        fail: AtomicBool,
        last: std::sync::Mutex<Option<Arc<FakeSession>>>,
    }

    impl CountingFactory {
        fn new() -> Self {
            Self {
                created: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                last: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SessionFactory for CountingFactory {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn create(
            &self,
            _credential: Option<&Credential>,
            _variant: ClientVariant,
        ) -> Result<Arc<dyn MetadataSession>, SourceError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(SourceError::Parse("bootstrap failed".to_string()));
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            let session = Arc::new(FakeSession {
                signed_out: AtomicUsize::new(0),
            });
            *self.last.lock().unwrap() = Some(Arc::clone(&session));
            Ok(session)
        }
    }

    #[tokio::test]
    async fn test_same_credential_reuses_session() {
        let factory = Arc::new(CountingFactory::new());
        let manager = SessionManager::new(Arc::clone(&factory) as Arc<dyn SessionFactory>);
        let cred = Credential::Raw("SAPISID=a".to_string());

        let first = manager
            .ensure_session(Some(&cred), ClientVariant::Web)
            .await
            .unwrap();
        let second = manager
            .ensure_session(Some(&cred), ClientVariant::Web)
            .await
            .unwrap();

        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_credential_change_recreates_and_signs_out() {
        let factory = Arc::new(CountingFactory::new());
        let manager = SessionManager::new(Arc::clone(&factory) as Arc<dyn SessionFactory>);

        let old = Credential::Raw("SAPISID=old".to_string());
        manager.ensure_session(Some(&old), ClientVariant::Web).await;
        let old_session = factory.last.lock().unwrap().take().unwrap();

        let new = Credential::Raw("SAPISID=new".to_string());
        manager.ensure_session(Some(&new), ClientVariant::Web).await;
        manager.ensure_session(Some(&new), ClientVariant::Web).await;

        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
        assert_eq!(old_session.signed_out.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_creation_failure_is_absent_then_retries() {
        let factory = Arc::new(CountingFactory::new());
        let manager = SessionManager::new(Arc::clone(&factory) as Arc<dyn SessionFactory>);

        factory.fail.store(true, Ordering::SeqCst);
        assert!(manager.ensure_session(None, ClientVariant::Web).await.is_none());

        factory.fail.store(false, Ordering::SeqCst);
        assert!(manager.ensure_session(None, ClientVariant::Web).await.is_some());
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_adding_credential_counts_as_change() {
        let factory = Arc::new(CountingFactory::new());
        let manager = SessionManager::new(Arc::clone(&factory) as Arc<dyn SessionFactory>);

        manager.ensure_session(None, ClientVariant::Web).await;
        let cred = Credential::Raw("SAPISID=a".to_string());
        manager.ensure_session(Some(&cred), ClientVariant::Web).await;

        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }
}
