// Source orchestration
//
// Front door of the crate: classifies each query, routes it to the
// metadata backend or the external extractor, and wires the fallbacks
// between the two. Direct video URLs go extractor-first with a backend
// fallback; playlists, mixes, and search stay on the backend alone.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::resolver::backend::innertube::InnertubeFactory;
use crate::resolver::backend::session::SessionManager;
use crate::resolver::backend::{MetadataSession, SessionFactory};
use crate::resolver::errors::SourceError;
use crate::resolver::extractor::YtDlpClient;
use crate::resolver::mix::{self, MIX_PREFIX};
use crate::resolver::models::{
    PlaylistInfo, QueryKind, RequestContext, Resolved, SourceConfig, TrackInfo,
};
use crate::resolver::urls;

// Recommendations delivered to the host per request
const RELATED_LIMIT: usize = 5;
// Candidates fetched before history filtering cuts them down
const RELATED_FETCH_LIMIT: usize = 20;

pub struct SourceResolver {
    config: SourceConfig,
    sessions: SessionManager,
    extractor: YtDlpClient,
}

impl SourceResolver {
    pub fn new(config: SourceConfig) -> Self {
        let extractor = YtDlpClient::new(config.extractor_path.as_deref());
        Self {
            sessions: SessionManager::new(Arc::new(InnertubeFactory)),
            extractor,
            config,
        }
    }

    /// Replaces the metadata backend factory
    pub fn with_session_factory(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.sessions = SessionManager::new(factory);
        self
    }

    /// Checks the extractor binary exists before the source takes traffic
    pub fn activate(&self) -> Result<(), SourceError> {
        if !self.extractor.available() {
            return Err(SourceError::BinaryNotFound(
                self.extractor.binary_path().to_string(),
            ));
        }
        info!(binary = self.extractor.binary_path(), "source activated");
        Ok(())
    }

    /// Whether this source would accept the query at all. Recognized-site
    /// URLs ride on the backend capabilities; everything else is probed
    /// against the extractor.
    pub async fn can_handle(&self, query: &str, kind: QueryKind) -> bool {
        let query = query.trim();
        if !treat_as_url(query, kind) {
            return self.config.search_enabled;
        }
        if !self.config.url_extraction_enabled {
            return false;
        }
        if urls::is_recognized_site_url(query) && self.config.search_enabled {
            return true;
        }
        if !urls::validate_url(query) {
            return false;
        }
        self.extractor.probe(query).await
    }

    /// Resolves a query to a track, a playlist or nothing
    pub async fn resolve(
        &self,
        query: &str,
        kind: QueryKind,
        ctx: &RequestContext,
    ) -> Result<Resolved, SourceError> {
        let query = query.trim();
        debug!(
            requester = ctx.requester.as_deref().unwrap_or("-"),
            "resolving {:?}",
            query
        );
        if treat_as_url(query, kind) {
            self.resolve_url(query, ctx).await
        } else {
            self.resolve_search(query, ctx).await
        }
    }

    /// Fresh playable stream URL for a previously resolved track. Always
    /// a new extraction; stream URLs expire and are never cached.
    pub async fn stream_url(
        &self,
        track_url: &str,
        ctx: &RequestContext,
    ) -> Result<String, SourceError> {
        self.extractor
            .resolve_stream_url(
                track_url,
                &self.config.quality_selector,
                ctx.credential.as_ref(),
            )
            .await
    }

    /// Up to five recommendations seeded by a finished track, with the
    /// seed itself and already-played tracks filtered out. Degrades to
    /// empty rather than erroring.
    pub async fn related_tracks(&self, seed: &TrackInfo, ctx: &RequestContext) -> Vec<TrackInfo> {
        if !urls::is_recognized_site_url(&seed.canonical_url) {
            return Vec::new();
        }
        let session = match self.session(ctx).await {
            Some(session) => session,
            None => return Vec::new(),
        };

        let mut candidates = match session.related(&seed.id, RELATED_FETCH_LIMIT).await {
            Ok(tracks) => tracks,
            Err(e) => {
                debug!("related lookup for {} failed: {}", seed.id, e);
                Vec::new()
            }
        };
        if candidates.is_empty() {
            let fallback = format!("{} music", seed.author);
            candidates = match session.search(&fallback, RELATED_FETCH_LIMIT).await {
                Ok(tracks) => tracks,
                Err(e) => {
                    debug!("related search fallback failed: {}", e);
                    return Vec::new();
                }
            };
        }

        let history: HashSet<&str> = ctx.history.iter().map(String::as_str).collect();
        candidates.retain(|t| {
            t.canonical_url != seed.canonical_url && !history.contains(t.canonical_url.as_str())
        });
        candidates.truncate(RELATED_LIMIT);
        candidates
    }

    async fn resolve_url(&self, url: &str, ctx: &RequestContext) -> Result<Resolved, SourceError> {
        if !self.config.url_extraction_enabled {
            return Ok(Resolved::None);
        }

        if urls::is_recognized_site_url(url) {
            // A list parameter wins over a video id in the same URL
            if urls::is_playlist_url(url) {
                if let Some(playlist_id) = urls::extract_playlist_id(url) {
                    let playlist = self.resolve_playlist(&playlist_id, ctx).await?;
                    return Ok(Resolved::Playlist(playlist));
                }
            }
            if let Some(video_id) = urls::extract_video_id(url) {
                let track = self.resolve_video(&video_id, ctx).await?;
                return Ok(Resolved::Track(track));
            }
            return Err(SourceError::NotFound(format!(
                "no video or playlist id in {}",
                url
            )));
        }

        if !urls::validate_url(url) {
            return Ok(Resolved::None);
        }
        let track = self.extractor.fetch_flat_info(url).await?;
        Ok(Resolved::Track(track))
    }

    /// Extractor first, backend as fallback. When both fail the backend
    /// error wins as the more recent diagnosis.
    async fn resolve_video(
        &self,
        video_id: &str,
        ctx: &RequestContext,
    ) -> Result<TrackInfo, SourceError> {
        let watch = urls::watch_url(video_id);
        match self
            .extractor
            .fetch_metadata(&watch, ctx.credential.as_ref())
            .await
        {
            Ok(track) => Ok(track),
            Err(extractor_err) => {
                warn!(
                    "extractor metadata for {} failed, trying backend: {}",
                    video_id, extractor_err
                );
                match self.session(ctx).await {
                    Some(session) => session.video_info(video_id).await,
                    None => Err(extractor_err),
                }
            }
        }
    }

    async fn resolve_playlist(
        &self,
        playlist_id: &str,
        ctx: &RequestContext,
    ) -> Result<PlaylistInfo, SourceError> {
        let session = match self.session(ctx).await {
            Some(session) => session,
            None => {
                return Err(SourceError::PrivateOrUnavailable(
                    "metadata backend unavailable".to_string(),
                ))
            }
        };
        if playlist_id.starts_with(MIX_PREFIX) {
            mix::materialize_mix(session.as_ref(), playlist_id).await
        } else {
            session.playlist(playlist_id).await
        }
    }

    /// Search never errors toward the host: anything going wrong is
    /// logged and surfaces as no result.
    async fn resolve_search(
        &self,
        query: &str,
        ctx: &RequestContext,
    ) -> Result<Resolved, SourceError> {
        if !self.config.search_enabled {
            return Ok(Resolved::None);
        }
        let session = match self.session(ctx).await {
            Some(session) => session,
            None => {
                debug!("search for {:?} degraded, no metadata session", query);
                return Ok(Resolved::None);
            }
        };
        match session.search(query, 1).await {
            Ok(mut tracks) => {
                if tracks.is_empty() {
                    Ok(Resolved::None)
                } else {
                    Ok(Resolved::Track(tracks.remove(0)))
                }
            }
            Err(e) => {
                warn!("search for {:?} failed: {}", query, e);
                Ok(Resolved::None)
            }
        }
    }

    async fn session(&self, ctx: &RequestContext) -> Option<Arc<dyn MetadataSession>> {
        self.sessions
            .ensure_session(ctx.credential.as_ref(), self.config.client_variant)
            .await
    }
}

fn treat_as_url(query: &str, kind: QueryKind) -> bool {
    match kind {
        QueryKind::Url => true,
        QueryKind::Search => false,
        QueryKind::Auto => urls::is_url(query) || urls::is_recognized_site_url(query),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const WATCH: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn track(id: &str, title: &str) -> TrackInfo {
        TrackInfo {
            id: id.to_string(),
            title: title.to_string(),
            author: "Someone".to_string(),
            duration: "3:00".to_string(),
            thumbnail_url: None,
            canonical_url: urls::watch_url(id),
            view_count: "1".to_string(),
            description: None,
        }
    }

    #[derive(Default)]
    struct ScriptedSession {
        search_results: Mutex<Vec<TrackInfo>>,
        search_fails: bool,
        video_fails: bool,
        video_calls: AtomicUsize,
        related_results: Mutex<Vec<TrackInfo>>,
        related_fails: bool,
        playlist_calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataSession for ScriptedSession {
        async fn search(&self, _query: &str, limit: usize) -> Result<Vec<TrackInfo>, SourceError> {
            if self.search_fails {
                return Err(SourceError::Timeout(10));
            }
            let mut results = self.search_results.lock().unwrap().clone();
            results.truncate(limit);
            Ok(results)
        }

        async fn video_info(&self, id: &str) -> Result<TrackInfo, SourceError> {
            self.video_calls.fetch_add(1, Ordering::SeqCst);
            if self.video_fails {
                return Err(SourceError::NotFound(id.to_string()));
            }
            Ok(track(id, &format!("Backend {}", id)))
        }

        async fn playlist(&self, id: &str) -> Result<PlaylistInfo, SourceError> {
            self.playlist_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PlaylistInfo {
                id: id.to_string(),
                title: "Scripted List".to_string(),
                description: None,
                thumbnail_url: None,
                author: "Curator".to_string(),
                canonical_url: urls::playlist_url(id),
                tracks: vec![track("ccccccccccc", "One")],
            })
        }

        async fn related(&self, _id: &str, limit: usize) -> Result<Vec<TrackInfo>, SourceError> {
            if self.related_fails {
                return Err(SourceError::Timeout(10));
            }
            let mut results = self.related_results.lock().unwrap().clone();
            results.truncate(limit);
            Ok(results)
        }

        async fn sign_out(&self) -> Result<(), SourceError> {
            Ok(())
        }
    }

    struct ScriptedFactory {
        session: Arc<ScriptedSession>,
        fail: bool,
    }

    #[async_trait]
    impl SessionFactory for ScriptedFactory {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn create(
            &self,
            _credential: Option<&crate::resolver::models::Credential>,
            _variant: crate::resolver::models::ClientVariant,
        ) -> Result<Arc<dyn MetadataSession>, SourceError> {
            if self.fail {
                return Err(SourceError::Parse("no session today".to_string()));
            }
            Ok(Arc::clone(&self.session) as Arc<dyn MetadataSession>)
        }
    }

    fn write_stub(dir: &TempDir, body: &str) -> String {
        let path = dir.path().join("fake-yt-dlp");
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    fn resolver_with(
        dir: &TempDir,
        script: &str,
        session: Arc<ScriptedSession>,
        config: SourceConfig,
    ) -> SourceResolver {
        let config = config.with_extractor_path(Some(write_stub(dir, script)));
        SourceResolver::new(config).with_session_factory(Arc::new(ScriptedFactory {
            session,
            fail: false,
        }))
    }

    const FAILING_TOOL: &str = "#!/bin/sh\necho 'ERROR: Some novel failure' >&2\nexit 1\n";

    #[tokio::test]
    async fn test_search_returns_first_hit() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(ScriptedSession {
            search_results: Mutex::new(vec![
                track("aaaaaaaaaaa", "Hit"),
                track("bbbbbbbbbbb", "Second"),
            ]),
            ..Default::default()
        });
        let resolver = resolver_with(&dir, FAILING_TOOL, session, SourceConfig::default());

        let resolved = resolver
            .resolve("some song", QueryKind::Search, &RequestContext::default())
            .await
            .unwrap();
        match resolved {
            Resolved::Track(t) => assert_eq!(t.title, "Hit"),
            other => panic!("expected a track, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_degrades_to_none() {
        let dir = TempDir::new().unwrap();

        // No hits
        let empty = Arc::new(ScriptedSession::default());
        let resolver = resolver_with(&dir, FAILING_TOOL, empty, SourceConfig::default());
        let resolved = resolver
            .resolve("nothing here", QueryKind::Search, &RequestContext::default())
            .await
            .unwrap();
        assert!(resolved.is_none());

        // Backend error
        let failing = Arc::new(ScriptedSession {
            search_fails: true,
            ..Default::default()
        });
        let resolver = resolver_with(&dir, FAILING_TOOL, failing, SourceConfig::default());
        let resolved = resolver
            .resolve("boom", QueryKind::Search, &RequestContext::default())
            .await
            .unwrap();
        assert!(resolved.is_none());

        // No session at all
        let resolver = SourceResolver::new(
            SourceConfig::default().with_extractor_path(Some(write_stub(&dir, FAILING_TOOL))),
        )
        .with_session_factory(Arc::new(ScriptedFactory {
            session: Arc::new(ScriptedSession::default()),
            fail: true,
        }));
        let resolved = resolver
            .resolve("no backend", QueryKind::Search, &RequestContext::default())
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_search_disabled_returns_none() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(ScriptedSession {
            search_results: Mutex::new(vec![track("aaaaaaaaaaa", "Hit")]),
            ..Default::default()
        });
        let resolver = resolver_with(
            &dir,
            FAILING_TOOL,
            session,
            SourceConfig::default().with_search_enabled(false),
        );
        let resolved = resolver
            .resolve("some song", QueryKind::Search, &RequestContext::default())
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_video_url_prefers_extractor() {
        let dir = TempDir::new().unwrap();
        let json = r#"{"id":"dQw4w9WgXcQ","title":"From Extractor","uploader":"U","duration":212,"webpage_url":"https://www.youtube.com/watch?v=dQw4w9WgXcQ"}"#;
        let session = Arc::new(ScriptedSession::default());
        let resolver = resolver_with(
            &dir,
            &format!("#!/bin/sh\necho '{}'\n", json),
            Arc::clone(&session),
            SourceConfig::default(),
        );

        let resolved = resolver
            .resolve(WATCH, QueryKind::Auto, &RequestContext::default())
            .await
            .unwrap();
        match resolved {
            Resolved::Track(t) => assert_eq!(t.title, "From Extractor"),
            other => panic!("expected a track, got {:?}", other),
        }
        assert_eq!(session.video_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_video_url_falls_back_to_backend() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(ScriptedSession::default());
        let resolver = resolver_with(
            &dir,
            FAILING_TOOL,
            Arc::clone(&session),
            SourceConfig::default(),
        );

        let resolved = resolver
            .resolve(WATCH, QueryKind::Auto, &RequestContext::default())
            .await
            .unwrap();
        match resolved {
            Resolved::Track(t) => assert_eq!(t.title, "Backend dQw4w9WgXcQ"),
            other => panic!("expected a track, got {:?}", other),
        }
        assert_eq!(session.video_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_video_fallback_propagates_backend_error() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(ScriptedSession {
            video_fails: true,
            ..Default::default()
        });
        let resolver = resolver_with(&dir, FAILING_TOOL, session, SourceConfig::default());

        let err = resolver
            .resolve(WATCH, QueryKind::Auto, &RequestContext::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_video_without_backend_keeps_extractor_error() {
        let dir = TempDir::new().unwrap();
        let resolver = SourceResolver::new(
            SourceConfig::default().with_extractor_path(Some(write_stub(&dir, FAILING_TOOL))),
        )
        .with_session_factory(Arc::new(ScriptedFactory {
            session: Arc::new(ScriptedSession::default()),
            fail: true,
        }));

        let err = resolver
            .resolve(WATCH, QueryKind::Auto, &RequestContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::ExtractorError(_)));
    }

    #[tokio::test]
    async fn test_playlist_url_goes_to_backend() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(ScriptedSession::default());
        let resolver = resolver_with(
            &dir,
            FAILING_TOOL,
            Arc::clone(&session),
            SourceConfig::default(),
        );

        // The list parameter wins even with a video id present
        let resolved = resolver
            .resolve(
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLabc123",
                QueryKind::Auto,
                &RequestContext::default(),
            )
            .await
            .unwrap();
        match resolved {
            Resolved::Playlist(p) => {
                assert_eq!(p.title, "Scripted List");
                assert_eq!(p.id, "PLabc123");
            }
            other => panic!("expected a playlist, got {:?}", other),
        }
        assert_eq!(session.playlist_calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.video_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mix_url_is_materialized() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(ScriptedSession {
            related_results: Mutex::new(vec![
                track("rel00000001", "R1"),
                track("rel00000002", "R2"),
            ]),
            ..Default::default()
        });
        let resolver = resolver_with(
            &dir,
            FAILING_TOOL,
            Arc::clone(&session),
            SourceConfig::default(),
        );

        let resolved = resolver
            .resolve(
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=RDdQw4w9WgXcQ",
                QueryKind::Auto,
                &RequestContext::default(),
            )
            .await
            .unwrap();
        match resolved {
            Resolved::Playlist(p) => {
                assert_eq!(p.title, "Mix - Backend dQw4w9WgXcQ");
                assert_eq!(p.tracks.len(), 3);
                assert_eq!(p.tracks[0].id, "dQw4w9WgXcQ");
            }
            other => panic!("expected a mix playlist, got {:?}", other),
        }
        assert_eq!(session.playlist_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_foreign_url_uses_flat_info() {
        let dir = TempDir::new().unwrap();
        let json = r#"{"id":"x1","title":"Foreign Clip","duration":61}"#;
        let session = Arc::new(ScriptedSession::default());
        let resolver = resolver_with(
            &dir,
            &format!("#!/bin/sh\necho '{}'\n", json),
            session,
            SourceConfig::default(),
        );

        let resolved = resolver
            .resolve(
                "https://example.com/clip",
                QueryKind::Url,
                &RequestContext::default(),
            )
            .await
            .unwrap();
        match resolved {
            Resolved::Track(t) => {
                assert_eq!(t.title, "Foreign Clip");
                assert_eq!(t.canonical_url, "https://example.com/clip");
            }
            other => panic!("expected a track, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_url_loading_disabled_returns_none() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver_with(
            &dir,
            FAILING_TOOL,
            Arc::new(ScriptedSession::default()),
            SourceConfig::default().with_url_extraction_enabled(false),
        );
        let resolved = resolver
            .resolve(WATCH, QueryKind::Url, &RequestContext::default())
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_recognized_url_without_ids_is_not_found() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver_with(
            &dir,
            FAILING_TOOL,
            Arc::new(ScriptedSession::default()),
            SourceConfig::default(),
        );
        let err = resolver
            .resolve(
                "https://www.youtube.com/feed/library",
                QueryKind::Url,
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_related_filters_seed_and_history() {
        let dir = TempDir::new().unwrap();
        let seed = track("dQw4w9WgXcQ", "Seed");
        let mut related = vec![seed.clone()];
        for i in 1..8 {
            related.push(track(&format!("rel{:08}", i), &format!("R{}", i)));
        }
        let session = Arc::new(ScriptedSession {
            related_results: Mutex::new(related),
            ..Default::default()
        });
        let resolver = resolver_with(&dir, FAILING_TOOL, session, SourceConfig::default());

        let ctx = RequestContext {
            history: vec![urls::watch_url("rel00000001")],
            ..Default::default()
        };
        let tracks = resolver.related_tracks(&seed, &ctx).await;

        assert_eq!(tracks.len(), RELATED_LIMIT);
        assert!(tracks.iter().all(|t| t.id != "dQw4w9WgXcQ"));
        assert!(tracks.iter().all(|t| t.id != "rel00000001"));
        assert_eq!(tracks[0].id, "rel00000002");
    }

    #[tokio::test]
    async fn test_related_falls_back_to_search() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(ScriptedSession {
            search_results: Mutex::new(vec![
                track("srch0000001", "S1"),
                track("srch0000002", "S2"),
            ]),
            ..Default::default()
        });
        let resolver = resolver_with(&dir, FAILING_TOOL, session, SourceConfig::default());

        let seed = track("dQw4w9WgXcQ", "Seed");
        let tracks = resolver
            .related_tracks(&seed, &RequestContext::default())
            .await;
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "srch0000001");
    }

    #[tokio::test]
    async fn test_related_for_foreign_seed_is_empty() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver_with(
            &dir,
            FAILING_TOOL,
            Arc::new(ScriptedSession::default()),
            SourceConfig::default(),
        );
        let mut seed = track("x1x1x1x1x1x", "Elsewhere");
        seed.canonical_url = "https://example.com/clip".to_string();
        assert!(resolver
            .related_tracks(&seed, &RequestContext::default())
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_stream_url_extracted_fresh_each_call() {
        let dir = TempDir::new().unwrap();
        let counter = dir.path().join("calls");
        let body = format!(
            "#!/bin/sh\necho run >> {}\necho 'https://stream.example/fresh'\n",
            counter.display()
        );
        let resolver = resolver_with(
            &dir,
            &body,
            Arc::new(ScriptedSession::default()),
            SourceConfig::default(),
        );

        let ctx = RequestContext::default();
        let first = resolver.stream_url(WATCH, &ctx).await.unwrap();
        let second = resolver.stream_url(WATCH, &ctx).await.unwrap();
        assert_eq!(first, second);

        let calls = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(calls.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_can_handle_matrix() {
        let dir = TempDir::new().unwrap();
        let probe_ok = write_stub(&dir, "#!/bin/sh\nexit 0\n");
        let resolver = SourceResolver::new(
            SourceConfig::default().with_extractor_path(Some(probe_ok)),
        );

        assert!(resolver.can_handle("some song", QueryKind::Auto).await);
        assert!(resolver.can_handle(WATCH, QueryKind::Auto).await);
        assert!(
            resolver
                .can_handle("youtube.com/watch?v=dQw4w9WgXcQ", QueryKind::Auto)
                .await
        );
        assert!(resolver.can_handle("https://example.com/clip", QueryKind::Url).await);
        assert!(!resolver.can_handle("file:///etc/passwd", QueryKind::Url).await);

        let dir2 = TempDir::new().unwrap();
        let probe_no = write_stub(&dir2, "#!/bin/sh\nexit 1\n");
        let declining = SourceResolver::new(
            SourceConfig::default().with_extractor_path(Some(probe_no.clone())),
        );
        assert!(
            !declining
                .can_handle("https://example.com/clip", QueryKind::Url)
                .await
        );

        // With search off, even recognized URLs stand or fall on the probe
        let no_search = SourceResolver::new(
            SourceConfig::default()
                .with_search_enabled(false)
                .with_extractor_path(Some(probe_no)),
        );
        assert!(!no_search.can_handle(WATCH, QueryKind::Auto).await);

        let disabled = SourceResolver::new(
            SourceConfig::default()
                .with_search_enabled(false)
                .with_url_extraction_enabled(false),
        );
        assert!(!disabled.can_handle("some song", QueryKind::Auto).await);
        assert!(!disabled.can_handle(WATCH, QueryKind::Auto).await);
    }

    #[tokio::test]
    async fn test_activate_requires_binary() {
        let dir = TempDir::new().unwrap();
        let resolver = SourceResolver::new(
            SourceConfig::default()
                .with_extractor_path(Some(write_stub(&dir, "#!/bin/sh\nexit 0\n"))),
        );
        assert!(resolver.activate().is_ok());

        let missing = SourceResolver::new(
            SourceConfig::default()
                .with_extractor_path(Some("/nonexistent/definitely-not-here".to_string())),
        );
        let err = missing.activate().unwrap_err();
        assert!(matches!(err, SourceError::BinaryNotFound(_)));
    }
}
