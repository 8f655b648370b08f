//! In-memory session registry.
//!
//! The map lock is held only to look up or insert handles; each session has
//! its own mutex, so work on one session never blocks another. Session
//! locks are never held across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::AssessmentError;
use crate::model::Phase;
use crate::session::Session;

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Lock a session, recovering the data if a previous holder panicked.
///
/// Transitions validate before mutating, so a poisoned session is still
/// consistent.
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its id and return the handle.
    pub async fn insert(&self, session: Session) -> SessionHandle {
        let id = session.id().to_string();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        handle
    }

    pub async fn get(&self, id: &str) -> Result<SessionHandle, AssessmentError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AssessmentError::NotFound(format!("session {id}")))
    }

    /// Run `f` with the session locked.
    pub async fn with_session<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> Result<R, AssessmentError>,
    ) -> Result<R, AssessmentError> {
        let handle = self.get(id).await?;
        let mut session = lock_session(&handle);
        f(&mut session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop completed sessions that finished before `cutoff`.
    ///
    /// Sessions still in progress are kept regardless of age.
    pub async fn evict_completed_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| {
            let session = lock_session(handle);
            !(session.phase() == Phase::Completed
                && session.completed_at().is_some_and(|at| at <= cutoff))
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::QuestionBank;
    use crate::evaluator::fallback_evaluation;
    use crate::model::{Candidate, Difficulty, SkillCategory};
    use crate::report::ReportBuilder;

    fn session(id: &str) -> Session {
        let questions = QuestionBank::builtin()
            .select(SkillCategory::Charts, Difficulty::Easy, 1)
            .unwrap();
        Session::new(
            id.into(),
            Candidate::named("Lin"),
            SkillCategory::Charts,
            Difficulty::Easy,
            questions,
        )
        .unwrap()
    }

    fn complete(s: &mut Session) {
        s.start().unwrap();
        let p = s.reserve_answer(None).unwrap();
        let eval = fallback_evaluation(&p.question, "chart", "test".into());
        s.record_evaluation(p.index, "chart".into(), eval).unwrap();
        let report = ReportBuilder::default().build_scores(s);
        s.complete(report).unwrap();
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = SessionStore::new();
        store.insert(session("a")).await;
        assert_eq!(store.len().await, 1);
        let handle = store.get("a").await.unwrap();
        assert_eq!(lock_session(&handle).id(), "a");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = SessionStore::new();
        let err = store.get("missing").await.unwrap_err();
        assert!(matches!(err, AssessmentError::NotFound(_)));
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn with_session_mutates_in_place() {
        let store = SessionStore::new();
        store.insert(session("a")).await;
        store
            .with_session("a", |s| s.start().map(|_| ()))
            .await
            .unwrap();
        let phase = store.with_session("a", |s| Ok(s.phase())).await.unwrap();
        assert_eq!(phase, Phase::Questioning);
    }

    #[tokio::test]
    async fn eviction_keeps_active_sessions() {
        let store = SessionStore::new();
        store.insert(session("active")).await;
        let mut done = session("done");
        complete(&mut done);
        store.insert(done).await;

        let removed = store.evict_completed_before(Utc::now()).await;
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get("active").await.is_ok());
        assert!(store.get("done").await.is_err());
    }

    #[tokio::test]
    async fn eviction_respects_cutoff() {
        let store = SessionStore::new();
        let mut done = session("done");
        complete(&mut done);
        store.insert(done).await;

        let an_hour_ago = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(store.evict_completed_before(an_hour_ago).await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn poisoned_session_is_still_usable() {
        let store = SessionStore::new();
        let handle = store.insert(session("p")).await;
        let h = handle.clone();
        let _ = std::thread::spawn(move || {
            let _guard = h.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(handle.is_poisoned());
        let phase = store.with_session("p", |s| Ok(s.phase())).await.unwrap();
        assert_eq!(phase, Phase::Init);
    }
}
