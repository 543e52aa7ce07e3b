//! Session management
//!
//! An `AnalysisSession` carries the state of one user's work: the video
//! that was found and the cached result of the last successful analysis.
//! `SessionStore` persists sessions under the data directory and tracks
//! which one is current.
//!
//! A persisted Analyzing state names the process running it, so other
//! processes sharing the data directory see the analysis as in flight
//! until that process exits or the run outlives the stale timeout.
use crate::aggregate::AnalysisResult;
use crate::error::{Result, TubesentError};
use crate::youtube::VideoRef;
use chrono::{DateTime, Duration, Utc};
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const STATE_FILE: &str = "state.json";
const CURRENT_FILE: &str = "current";
const DEFAULT_STALE_AFTER_SECS: i64 = 3600;

/// The process that started an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOwner {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

impl AnalysisOwner {
    /// Owner record for the calling process
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            started_at: Utc::now(),
        }
    }

    /// Check if the owning process still exists
    pub fn is_alive(&self) -> bool {
        let Ok(pid) = i32::try_from(self.pid) else {
            return false;
        };
        // Signal 0 only checks existence; EPERM means another user owns the process
        !matches!(kill(Pid::from_raw(pid), None), Err(Errno::ESRCH))
    }

    /// An analysis is abandoned once its process is gone or it ran past `max_age`
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        !self.is_alive() || now - self.started_at > max_age
    }
}

/// Where a session is in the find → analyze flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing selected yet
    Idle,
    /// A video was found and can be analyzed
    VideoFound { video: VideoRef },
    /// An analysis is running for the video
    Analyzing {
        video: VideoRef,
        owner: AnalysisOwner,
    },
    /// The last analysis completed and its result is cached
    Analyzed {
        video: VideoRef,
        result: Box<AnalysisResult>,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::VideoFound { .. } => "video_found",
            SessionState::Analyzing { .. } => "analyzing",
            SessionState::Analyzed { .. } => "analyzed",
        }
    }
}

/// An analysis session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSession {
    /// Unique session identifier
    pub id: Uuid,

    /// Human-readable session name
    pub name: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    state: SessionState,
}

impl AnalysisSession {
    /// Create a new idle session
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            state: SessionState::Idle,
        }
    }

    /// Create a new session with generated name based on timestamp
    pub fn new_with_timestamp() -> Self {
        let name = format!("session_{}", Utc::now().format("%Y%m%d_%H%M%S"));
        Self::new(name)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The selected video, if any
    pub fn video(&self) -> Option<&VideoRef> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::VideoFound { video }
            | SessionState::Analyzing { video, .. }
            | SessionState::Analyzed { video, .. } => Some(video),
        }
    }

    /// The cached result of the last successful analysis
    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            SessionState::Analyzed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self.state, SessionState::Analyzing { .. })
    }

    /// The process running the current analysis, if one is in flight
    pub fn analysis_owner(&self) -> Option<&AnalysisOwner> {
        match &self.state {
            SessionState::Analyzing { owner, .. } => Some(owner),
            _ => None,
        }
    }

    /// Check that a new video may be selected
    ///
    /// Allowed from Idle and VideoFound. A session holding a result must be
    /// reset first.
    pub fn ensure_can_select_video(&self) -> Result<()> {
        match &self.state {
            SessionState::Idle | SessionState::VideoFound { .. } => Ok(()),
            SessionState::Analyzing { video, .. } => Err(TubesentError::AnalysisInProgress {
                video_id: video.id.clone(),
            }),
            SessionState::Analyzed { .. } => Err(TubesentError::InvalidState(
                "session already holds an analysis; reset it before finding another video"
                    .to_string(),
            )),
        }
    }

    /// Select a video
    pub fn set_video(&mut self, video: VideoRef) -> Result<()> {
        self.ensure_can_select_video()?;
        self.transition(SessionState::VideoFound { video });
        Ok(())
    }

    /// Enter the Analyzing state and return the video to analyze
    ///
    /// A previously cached result is discarded.
    pub fn begin_analysis(&mut self) -> Result<VideoRef> {
        let video = match &self.state {
            SessionState::Idle => {
                return Err(TubesentError::InvalidState(
                    "no video selected; find a video first".to_string(),
                ))
            }
            SessionState::Analyzing { video, .. } => {
                return Err(TubesentError::AnalysisInProgress {
                    video_id: video.id.clone(),
                })
            }
            SessionState::VideoFound { video } | SessionState::Analyzed { video, .. } => {
                video.clone()
            }
        };

        self.transition(SessionState::Analyzing {
            video: video.clone(),
            owner: AnalysisOwner::current(),
        });
        Ok(video)
    }

    /// Cache a completed result
    pub fn finish_analysis(&mut self, result: AnalysisResult) -> Result<()> {
        match &self.state {
            SessionState::Analyzing { video, .. } => {
                let video = video.clone();
                self.transition(SessionState::Analyzed {
                    video,
                    result: Box::new(result),
                });
                Ok(())
            }
            other => Err(TubesentError::InvalidState(format!(
                "cannot finish an analysis from state '{}'",
                other.name()
            ))),
        }
    }

    /// Leave the Analyzing state after a failure, keeping the video
    pub fn abort_analysis(&mut self) {
        if let SessionState::Analyzing { video, .. } = &self.state {
            let video = video.clone();
            self.transition(SessionState::VideoFound { video });
        }
    }

    /// Discard the video and any cached result
    pub fn reset(&mut self) {
        self.transition(SessionState::Idle);
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            "Session {} transition: {} -> {}",
            self.name,
            self.state.name(),
            next.name()
        );
        self.state = next;
        self.updated_at = Utc::now();
    }

    /// Get the directory for this session
    pub fn session_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join("sessions").join(self.id.to_string())
    }
}

/// Persists sessions as JSON under `<data_dir>/sessions/<id>/state.json`
pub struct SessionStore {
    data_dir: PathBuf,
    stale_after: Duration,
}

impl SessionStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            stale_after: Duration::seconds(DEFAULT_STALE_AFTER_SECS),
        }
    }

    /// Set how long a saved analysis may run before it is treated as abandoned
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    /// Save a session
    pub fn save(&self, session: &AnalysisSession) -> Result<()> {
        let session_dir = session.session_dir(&self.data_dir);
        std::fs::create_dir_all(&session_dir).map_err(|e| TubesentError::Io {
            source: e,
            context: format!(
                "Failed to create session directory: {}",
                session_dir.display()
            ),
        })?;

        let state_file = session_dir.join(STATE_FILE);
        let content = serde_json::to_string_pretty(session).map_err(|e| TubesentError::Json {
            source: e,
            context: "Failed to serialize session state".to_string(),
        })?;
        std::fs::write(&state_file, content).map_err(|e| TubesentError::Io {
            source: e,
            context: format!(
                "Failed to write session state file: {}",
                state_file.display()
            ),
        })?;

        Ok(())
    }

    /// Load a session by ID
    ///
    /// A session saved mid-analysis stays Analyzing while its owner is
    /// running. An abandoned one comes back in the VideoFound state.
    pub fn load(&self, id: &Uuid) -> Result<AnalysisSession> {
        let state_file = self.sessions_dir().join(id.to_string()).join(STATE_FILE);

        if !state_file.exists() {
            return Err(TubesentError::SessionNotFound { id: id.to_string() });
        }

        let content = std::fs::read_to_string(&state_file).map_err(|e| TubesentError::Io {
            source: e,
            context: format!(
                "Failed to read session state file: {}",
                state_file.display()
            ),
        })?;
        let mut session: AnalysisSession =
            serde_json::from_str(&content).map_err(|e| TubesentError::Json {
                source: e,
                context: "Failed to deserialize session state".to_string(),
            })?;

        if let Some(owner) = session.analysis_owner() {
            if owner.is_stale(Utc::now(), self.stale_after) {
                warn!(
                    "Session {} holds an abandoned analysis (pid {}, started {}); restoring to video_found",
                    session.name, owner.pid, owner.started_at
                );
                session.abort_analysis();
            }
        }

        Ok(session)
    }

    /// Enter the Analyzing state and persist it before any work starts
    ///
    /// The stored copy is checked first, so an analysis started by another
    /// process after `session` was loaded is still refused.
    pub fn begin_analysis(&self, session: &mut AnalysisSession) -> Result<VideoRef> {
        match self.load(&session.id) {
            Ok(stored) => {
                if let SessionState::Analyzing { video, .. } = stored.state() {
                    return Err(TubesentError::AnalysisInProgress {
                        video_id: video.id.clone(),
                    });
                }
            }
            Err(TubesentError::SessionNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let video = session.begin_analysis()?;
        self.save(session)?;
        Ok(video)
    }

    /// Mark a session as current
    pub fn set_current(&self, session: &AnalysisSession) -> Result<()> {
        let dir = self.sessions_dir();
        std::fs::create_dir_all(&dir).map_err(|e| TubesentError::Io {
            source: e,
            context: format!("Failed to create sessions directory: {}", dir.display()),
        })?;

        let pointer = dir.join(CURRENT_FILE);
        std::fs::write(&pointer, session.id.to_string()).map_err(|e| TubesentError::Io {
            source: e,
            context: format!("Failed to write current session pointer: {}", pointer.display()),
        })
    }

    /// Load the current session, if one is recorded
    pub fn current(&self) -> Result<Option<AnalysisSession>> {
        let pointer = self.sessions_dir().join(CURRENT_FILE);
        if !pointer.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&pointer).map_err(|e| TubesentError::Io {
            source: e,
            context: format!("Failed to read current session pointer: {}", pointer.display()),
        })?;
        let id = Uuid::parse_str(content.trim()).map_err(|e| {
            TubesentError::Config(format!("Corrupt current session pointer: {}", e))
        })?;

        match self.load(&id) {
            Ok(session) => Ok(Some(session)),
            Err(TubesentError::SessionNotFound { .. }) => {
                warn!("Current session {} no longer exists", id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Load the current session or start a new one
    pub fn current_or_create(&self) -> Result<AnalysisSession> {
        if let Some(session) = self.current()? {
            return Ok(session);
        }

        let session = AnalysisSession::new_with_timestamp();
        self.save(&session)?;
        self.set_current(&session)?;
        Ok(session)
    }

    /// List all sessions, newest first
    pub fn list(&self) -> Result<Vec<AnalysisSession>> {
        let sessions_dir = self.sessions_dir();

        if !sessions_dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();

        for entry in std::fs::read_dir(&sessions_dir).map_err(|e| TubesentError::Io {
            source: e,
            context: format!(
                "Failed to read sessions directory: {}",
                sessions_dir.display()
            ),
        })? {
            let entry = entry.map_err(|e| TubesentError::Io {
                source: e,
                context: "Failed to read directory entry".to_string(),
            })?;

            if entry.path().is_dir() {
                if let Ok(id) = Uuid::parse_str(&entry.file_name().to_string_lossy()) {
                    if let Ok(session) = self.load(&id) {
                        sessions.push(session);
                    }
                }
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use tempfile::TempDir;

    fn video(id: &str) -> VideoRef {
        VideoRef {
            id: id.to_string(),
            title: "Judul".to_string(),
            thumbnail_url: format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id),
        }
    }

    fn empty_result(id: &str) -> AnalysisResult {
        Aggregator::default().aggregate(id, "test-model", &[], &[], 0, 0)
    }

    #[test]
    fn test_session_creation() {
        let session = AnalysisSession::new("test_session");
        assert_eq!(session.name, "test_session");
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.video().is_none());
    }

    #[test]
    fn test_full_transition_cycle() {
        let mut session = AnalysisSession::new("test");
        session.set_video(video("dQw4w9WgXcQ")).unwrap();
        assert_eq!(session.state().name(), "video_found");

        let selected = session.begin_analysis().unwrap();
        assert_eq!(selected.id, "dQw4w9WgXcQ");
        assert!(session.is_analyzing());

        session.finish_analysis(empty_result("dQw4w9WgXcQ")).unwrap();
        assert_eq!(session.result().unwrap().video_id, "dQw4w9WgXcQ");

        session.reset();
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.result().is_none());
    }

    #[test]
    fn test_second_analysis_rejected() {
        let mut session = AnalysisSession::new("test");
        session.set_video(video("dQw4w9WgXcQ")).unwrap();
        session.begin_analysis().unwrap();

        assert!(matches!(
            session.begin_analysis(),
            Err(TubesentError::AnalysisInProgress { .. })
        ));
        assert!(matches!(
            session.set_video(video("aaaaaaaaaaa")),
            Err(TubesentError::AnalysisInProgress { .. })
        ));
    }

    #[test]
    fn test_find_after_analysis_requires_reset() {
        let mut session = AnalysisSession::new("test");
        session.set_video(video("dQw4w9WgXcQ")).unwrap();
        session.begin_analysis().unwrap();
        session.finish_analysis(empty_result("dQw4w9WgXcQ")).unwrap();

        assert!(matches!(
            session.set_video(video("aaaaaaaaaaa")),
            Err(TubesentError::InvalidState(_))
        ));
    }

    #[test]
    fn test_analyze_without_video() {
        let mut session = AnalysisSession::new("test");
        assert!(matches!(
            session.begin_analysis(),
            Err(TubesentError::InvalidState(_))
        ));
    }

    #[test]
    fn test_abort_returns_to_video_found() {
        let mut session = AnalysisSession::new("test");
        session.set_video(video("dQw4w9WgXcQ")).unwrap();
        session.begin_analysis().unwrap();
        session.abort_analysis();

        assert_eq!(session.state().name(), "video_found");
        assert!(session.result().is_none());
    }

    #[test]
    fn test_store_roundtrip_and_current() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().to_path_buf());
        assert!(store.current().unwrap().is_none());

        let mut session = store.current_or_create().unwrap();
        session.set_video(video("dQw4w9WgXcQ")).unwrap();
        store.save(&session).unwrap();

        let current = store.current().unwrap().unwrap();
        assert_eq!(current.id, session.id);
        assert_eq!(current.video().unwrap().id, "dQw4w9WgXcQ");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_store_keeps_live_analysis_in_flight() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().to_path_buf());

        let mut first = store.current_or_create().unwrap();
        first.set_video(video("dQw4w9WgXcQ")).unwrap();
        store.save(&first).unwrap();

        store.begin_analysis(&mut first).unwrap();

        let mut second = store.current().unwrap().unwrap();
        assert!(second.is_analyzing());
        assert_eq!(second.analysis_owner().unwrap().pid, std::process::id());
        assert!(matches!(
            second.begin_analysis(),
            Err(TubesentError::AnalysisInProgress { .. })
        ));
        assert!(matches!(
            second.set_video(video("aaaaaaaaaaa")),
            Err(TubesentError::AnalysisInProgress { .. })
        ));
    }

    #[test]
    fn test_store_begin_checks_stored_copy() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().to_path_buf());

        let mut first = AnalysisSession::new("test");
        first.set_video(video("dQw4w9WgXcQ")).unwrap();
        store.save(&first).unwrap();
        let mut loaded_earlier = store.load(&first.id).unwrap();

        store.begin_analysis(&mut first).unwrap();

        assert!(matches!(
            store.begin_analysis(&mut loaded_earlier),
            Err(TubesentError::AnalysisInProgress { .. })
        ));
        assert_eq!(loaded_earlier.state().name(), "video_found");
    }

    #[test]
    fn test_store_recovers_analysis_of_exited_process() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().to_path_buf());

        let mut session = AnalysisSession::new("test");
        session.set_video(video("dQw4w9WgXcQ")).unwrap();
        session.state = SessionState::Analyzing {
            video: video("dQw4w9WgXcQ"),
            owner: AnalysisOwner {
                pid: i32::MAX as u32,
                started_at: Utc::now(),
            },
        };
        store.save(&session).unwrap();

        let loaded = store.load(&session.id).unwrap();
        assert_eq!(loaded.state().name(), "video_found");
        assert_eq!(loaded.video().unwrap().id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_store_recovers_expired_analysis() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().to_path_buf())
            .with_stale_after(Duration::minutes(30));

        let mut session = AnalysisSession::new("test");
        session.state = SessionState::Analyzing {
            video: video("dQw4w9WgXcQ"),
            owner: AnalysisOwner {
                pid: std::process::id(),
                started_at: Utc::now() - Duration::hours(2),
            },
        };
        store.save(&session).unwrap();

        let mut loaded = store.load(&session.id).unwrap();
        assert_eq!(loaded.state().name(), "video_found");
        assert!(store.begin_analysis(&mut loaded).is_ok());
    }

    #[test]
    fn test_owner_liveness() {
        assert!(AnalysisOwner::current().is_alive());

        let gone = AnalysisOwner {
            pid: i32::MAX as u32,
            started_at: Utc::now(),
        };
        assert!(!gone.is_alive());
        assert!(gone.is_stale(Utc::now(), Duration::hours(1)));
    }

    #[test]
    fn test_load_missing_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().to_path_buf());
        assert!(matches!(
            store.load(&Uuid::new_v4()),
            Err(TubesentError::SessionNotFound { .. })
        ));
    }
}
