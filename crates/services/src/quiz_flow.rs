use std::fmt;
use std::sync::Arc;

use quiz_core::model::{QuestionCatalog, QuizCategory, QuizSession, Transition};
use quiz_core::snapshot::{SESSION_KEY, SessionSnapshot};
use storage::store::SessionStore;

use crate::Clock;
use crate::error::FlowError;

/// Orchestrates a session against its store.
///
/// The flow owns the clock and the catalog, runs each operation on the
/// session, and writes a snapshot after every applied transition so a crash
/// at any point loses at most the operation in flight. Ignored transitions
/// write nothing.
#[derive(Clone)]
pub struct QuizFlow {
    clock: Clock,
    catalog: QuestionCatalog,
    store: Arc<dyn SessionStore>,
}

impl QuizFlow {
    #[must_use]
    pub fn new(clock: Clock, catalog: QuestionCatalog, store: Arc<dyn SessionStore>) -> Self {
        Self {
            clock,
            catalog,
            store,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Loads the saved session, or starts a fresh one when none is saved.
    ///
    /// A damaged blob is not fatal: whatever fields still decode are kept
    /// and the rest fall back to defaults, which in the worst case means
    /// starting over.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if the store cannot be read.
    pub async fn resume_or_new(&self) -> Result<QuizSession, FlowError> {
        match self.store.get(SESSION_KEY).await? {
            Some(blob) => {
                if serde_json::from_str::<serde_json::Value>(&blob).is_err() {
                    tracing::warn!("saved session blob is not valid JSON; keeping what decodes");
                }
                let snapshot = SessionSnapshot::decode(&blob);
                let session = QuizSession::restore(&self.catalog, &snapshot, self.clock.now());
                tracing::info!(phase = ?session.phase(), "resumed saved session");
                Ok(session)
            }
            None => {
                tracing::info!("no saved session; starting fresh");
                Ok(QuizSession::new())
            }
        }
    }

    /// Removes the saved session without touching the live one.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if the store cannot be written.
    pub async fn clear_saved(&self) -> Result<(), FlowError> {
        self.store.clear(SESSION_KEY).await?;
        tracing::info!("saved session cleared");
        Ok(())
    }

    /// Names the player.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if persisting the applied transition fails.
    pub async fn set_player(
        &self,
        session: &mut QuizSession,
        name: &str,
    ) -> Result<Transition, FlowError> {
        let transition = session.set_player(name);
        self.finish(session, transition, "set_player").await
    }

    /// Starts a run over the chosen category.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if persisting the applied transition fails.
    pub async fn select_category(
        &self,
        session: &mut QuizSession,
        category: QuizCategory,
    ) -> Result<Transition, FlowError> {
        let transition = session.select_category(&self.catalog, category, self.clock.now());
        self.finish(session, transition, "select_category").await
    }

    /// Toggles an option on the current question.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if persisting the applied transition fails.
    pub async fn toggle_option(
        &self,
        session: &mut QuizSession,
        option: &str,
    ) -> Result<Transition, FlowError> {
        let transition = session.toggle_option(option);
        self.finish(session, transition, "toggle_option").await
    }

    /// Grades the current selection.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if persisting the applied transition fails.
    pub async fn commit_answer(&self, session: &mut QuizSession) -> Result<Transition, FlowError> {
        let transition = session.commit_answer(self.clock.now());
        self.finish(session, transition, "commit_answer").await
    }

    /// Moves past the feedback screen.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if persisting the applied transition fails.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<Transition, FlowError> {
        let transition = session.advance(self.clock.now());
        self.finish(session, transition, "advance").await
    }

    /// Steps back to the previous question.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if persisting the applied transition fails.
    pub async fn go_back(&self, session: &mut QuizSession) -> Result<Transition, FlowError> {
        let transition = session.go_back();
        self.finish(session, transition, "go_back").await
    }

    /// Ends the run early.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if persisting the applied transition fails.
    pub async fn submit_early(&self, session: &mut QuizSession) -> Result<Transition, FlowError> {
        let transition = session.submit_early();
        self.finish(session, transition, "submit_early").await
    }

    /// Replays the current category from the results screen.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if persisting the applied transition fails.
    pub async fn restart(&self, session: &mut QuizSession) -> Result<Transition, FlowError> {
        let transition = session.restart(self.clock.now());
        self.finish(session, transition, "restart").await
    }

    /// Abandons the run for the category menu.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if persisting the applied transition fails.
    pub async fn go_home(&self, session: &mut QuizSession) -> Result<Transition, FlowError> {
        let transition = session.go_home();
        self.finish(session, transition, "go_home").await
    }

    async fn finish(
        &self,
        session: &QuizSession,
        transition: Transition,
        op: &'static str,
    ) -> Result<Transition, FlowError> {
        if transition.is_applied() {
            let blob = SessionSnapshot::capture(session).encode()?;
            self.store.set(SESSION_KEY, &blob).await?;
            tracing::debug!(op, phase = ?session.phase(), "session persisted");
        } else {
            tracing::debug!(op, phase = ?session.phase(), "operation ignored in current phase");
        }
        Ok(transition)
    }
}

impl fmt::Debug for QuizFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizFlow")
            .field("clock", &self.clock)
            .field("catalog_len", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use quiz_core::model::SessionPhase;
    use quiz_core::time::fixed_clock;
    use storage::store::{InMemoryStore, StorageError};

    use super::*;

    const CATALOG: &str = r#"{
        "questions": [
            {
                "text": "The borrow checker runs at compile time.",
                "type": "single",
                "options": ["True", "False"],
                "correctAnswer": "True"
            },
            {
                "text": "Shadowing a variable is a compile error.",
                "type": "single",
                "options": ["True", "False"],
                "correctAnswer": "False"
            }
        ]
    }"#;

    fn flow_with_store() -> (QuizFlow, InMemoryStore) {
        let store = InMemoryStore::new();
        let catalog = QuestionCatalog::from_json_str(CATALOG).expect("valid catalog");
        let flow = QuizFlow::new(fixed_clock(), catalog, Arc::new(store.clone()));
        (flow, store)
    }

    #[tokio::test]
    async fn applied_operations_persist_a_snapshot() {
        let (flow, store) = flow_with_store();
        let mut session = QuizSession::new();

        flow.set_player(&mut session, "Ada").await.unwrap();

        let blob = store.get(SESSION_KEY).await.unwrap().expect("saved blob");
        let snapshot = SessionSnapshot::decode(&blob);
        assert_eq!(snapshot.player_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn ignored_operations_write_nothing() {
        let (flow, store) = flow_with_store();
        let mut session = QuizSession::new();

        // Stale events before any state exists.
        assert!(flow.advance(&mut session).await.unwrap().is_ignored());
        assert!(flow.go_back(&mut session).await.unwrap().is_ignored());
        assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);

        flow.set_player(&mut session, "Ada").await.unwrap();
        let before = store.get(SESSION_KEY).await.unwrap();

        // Commit with no selection is ignored and must not rewrite the blob.
        assert!(flow.commit_answer(&mut session).await.unwrap().is_ignored());
        assert_eq!(store.get(SESSION_KEY).await.unwrap(), before);
    }

    #[tokio::test]
    async fn resume_restores_what_was_persisted() {
        let (flow, _store) = flow_with_store();
        let mut session = QuizSession::new();
        flow.set_player(&mut session, "Ada").await.unwrap();
        flow.select_category(&mut session, QuizCategory::TrueFalse)
            .await
            .unwrap();
        flow.toggle_option(&mut session, "True").await.unwrap();
        flow.commit_answer(&mut session).await.unwrap();

        let resumed = flow.resume_or_new().await.unwrap();
        assert_eq!(resumed.phase(), SessionPhase::ReviewingFeedback);
        assert_eq!(resumed.player(), Some("Ada"));
        assert_eq!(resumed.score(), 1);
        assert_eq!(resumed.selected_options(), ["True"]);
    }

    #[tokio::test]
    async fn resume_with_no_saved_session_starts_fresh() {
        let (flow, _store) = flow_with_store();
        let session = flow.resume_or_new().await.unwrap();
        assert_eq!(session.phase(), SessionPhase::NoPlayer);
    }

    #[tokio::test]
    async fn resume_with_corrupt_blob_recovers_what_it_can() {
        let (flow, store) = flow_with_store();
        store.set(SESSION_KEY, "{{{ not json").await.unwrap();

        let session = flow.resume_or_new().await.unwrap();
        assert_eq!(session.phase(), SessionPhase::NoPlayer);
    }

    #[tokio::test]
    async fn clear_saved_removes_the_blob() {
        let (flow, store) = flow_with_store();
        let mut session = QuizSession::new();
        flow.set_player(&mut session, "Ada").await.unwrap();

        flow.clear_saved().await.unwrap();
        assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);
    }

    struct FailingStore;

    #[async_trait]
    impl SessionStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("store is down".into()))
        }

        async fn set(&self, _key: &str, _blob: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("store is down".into()))
        }

        async fn clear(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("store is down".into()))
        }
    }

    #[tokio::test]
    async fn store_failures_surface_as_flow_errors() {
        let catalog = QuestionCatalog::from_json_str(CATALOG).expect("valid catalog");
        let flow = QuizFlow::new(fixed_clock(), catalog, Arc::new(FailingStore));
        let mut session = QuizSession::new();

        let err = flow.set_player(&mut session, "Ada").await.unwrap_err();
        assert!(matches!(err, FlowError::Storage(_)));
        // The in-memory session still advanced; only persistence failed.
        assert_eq!(session.player(), Some("Ada"));

        assert!(flow.resume_or_new().await.is_err());
    }
}
