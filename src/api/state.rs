use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::application::SessionState;
use crate::domain::DomainError;
use crate::infrastructure::{AppConfig, ChatOrchestrator, WebLoader};

pub type SharedSession = Arc<Mutex<SessionState>>;

struct SessionSlot {
    session: SharedSession,
    last_used: Instant,
}

/// Router state. Each session sits behind its own mutex so turns within a
/// session run one at a time while sessions stay independent.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub web_loader: Arc<WebLoader>,
    pub config: Arc<AppConfig>,
    sessions: Arc<RwLock<HashMap<Uuid, SessionSlot>>>,
}

impl AppState {
    pub fn new(orchestrator: ChatOrchestrator, config: AppConfig) -> Result<Self, DomainError> {
        let web_loader = WebLoader::new(Duration::from_secs(config.config.loader.timeout_seconds))?;
        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            web_loader: Arc::new(web_loader),
            config: Arc::new(config),
            sessions: Arc::default(),
        })
    }

    pub async fn create_session(&self) -> Uuid {
        let session = self.orchestrator.new_session();
        let id = session.id;
        self.sessions.write().await.insert(
            id,
            SessionSlot {
                session: Arc::new(Mutex::new(session)),
                last_used: Instant::now(),
            },
        );
        tracing::info!(session_id = %id, "session created");
        id
    }

    /// Looks up a session and marks it as used.
    pub async fn session(&self, id: Uuid) -> Result<SharedSession, DomainError> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("session {id}")))?;
        slot.last_used = Instant::now();
        Ok(slot.session.clone())
    }

    pub async fn end_session(&self, id: Uuid) -> Result<(), DomainError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                tracing::info!(session_id = %id, "session ended");
                Ok(())
            }
            None => Err(DomainError::not_found(format!("session {id}"))),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions unused for at least `ttl`. A session whose turn is in
    /// flight is kept.
    pub async fn sweep_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, slot| {
            let busy = slot.session.try_lock().is_err();
            let keep = busy || slot.last_used.elapsed() < ttl;
            if !keep {
                tracing::info!(session_id = %id, "idle session expired");
            }
            keep
        });

        before - sessions.len()
    }

    /// Runs [`Self::sweep_idle`] on the configured interval until the
    /// returned task is aborted.
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let state = self.clone();
        let ttl = Duration::from_secs(self.config.config.session.idle_ttl_seconds);
        let every = Duration::from_secs(self.config.config.session.sweep_interval_seconds);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let expired = state.sweep_idle(ttl).await;
                if expired > 0 {
                    tracing::debug!(expired, "session sweep finished");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ports::{CompletionRequest, CompletionResponse, LlmService},
        Document,
    };
    use crate::infrastructure::HashingEmbedding;
    use async_trait::async_trait;

    struct SilentLlm;

    #[async_trait]
    impl LlmService for SilentLlm {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, DomainError> {
            Err(DomainError::upstream("unused"))
        }
    }

    fn state() -> AppState {
        let mut config = AppConfig::default();
        config.config.embedding.provider = "hashing".to_string();
        let orchestrator = ChatOrchestrator::new(
            Arc::new(HashingEmbedding::new(32)),
            Arc::new(SilentLlm),
            &config,
        )
        .unwrap();
        AppState::new(orchestrator, config).unwrap()
    }

    #[tokio::test]
    async fn test_sweep_keeps_recent_sessions() {
        let state = state();
        state.create_session().await;
        state.create_session().await;

        assert_eq!(state.sweep_idle(Duration::from_secs(3_600)).await, 0);
        assert_eq!(state.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_sweep_drops_idle_sessions() {
        let state = state();
        let id = state.create_session().await;
        {
            let session = state.session(id).await.unwrap();
            let mut session = session.lock().await;
            state
                .orchestrator
                .ingest_document(&mut session, Document::new("a.txt", "Some text."))
                .await
                .unwrap();
        }

        assert_eq!(state.sweep_idle(Duration::ZERO).await, 1);
        assert_eq!(state.session_count().await, 0);
        assert!(matches!(
            state.session(id).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sweep_skips_session_in_use() {
        let state = state();
        let busy = state.create_session().await;
        state.create_session().await;

        let session = state.session(busy).await.unwrap();
        let _guard = session.lock().await;

        assert_eq!(state.sweep_idle(Duration::ZERO).await, 1);
        assert_eq!(state.session_count().await, 1);
    }
}
