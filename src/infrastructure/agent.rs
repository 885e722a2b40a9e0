use std::sync::Arc;
use tracing::instrument;

use crate::application::{
    DocumentService, IngestReport, PromptAssembler, RagService, SessionState,
};
use crate::domain::{
    ports::{CompletionRequest, EmbeddingService, LlmService, VectorIndex},
    Document, DomainError, SearchResult,
};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::providers::{build_embedder, build_llm};
use crate::infrastructure::retry::RetryPolicy;
use crate::infrastructure::vector_store::{IndexSnapshot, InMemoryVectorIndex, SessionSnapshot};

/// Runs the build phase for uploads and the retrieve, assemble, complete
/// sequence for each user turn. The only place that retries upstream calls.
pub struct ChatOrchestrator {
    documents: DocumentService,
    rag: RagService,
    assembler: PromptAssembler,
    llm: Arc<dyn LlmService>,
    retry: RetryPolicy,
    temperature: Option<f64>,
}

impl ChatOrchestrator {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        llm: Arc<dyn LlmService>,
        config: &AppConfig,
    ) -> Result<Self, DomainError> {
        config.validate()?;
        let rag = &config.config.rag;

        Ok(Self {
            documents: DocumentService::new(
                embedding.clone(),
                rag.chunk_size,
                rag.chunk_overlap,
            )?,
            rag: RagService::new(embedding, rag.top_k),
            assembler: PromptAssembler::new(&config.prompts.system, rag.max_prompt_chars),
            llm,
            retry: RetryPolicy::from_config(&config.config.retry),
            temperature: Some(config.config.llm.temperature),
        })
    }

    /// Wires the providers named in the configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        let embedding = build_embedder(&config.config.embedding)?;
        let llm = build_llm(&config.config.llm)?;
        Self::new(embedding, llm, config)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn new_session(&self) -> SessionState {
        SessionState::new(Box::new(InMemoryVectorIndex::new()))
    }

    /// Chunks, embeds and indexes `document`, replacing whatever the session
    /// had loaded. History restarts with the new document.
    #[instrument(skip(self, session, document), fields(session_id = %session.id, source = %document.source))]
    pub async fn ingest_document(
        &self,
        session: &mut SessionState,
        document: Document,
    ) -> Result<IngestReport, DomainError> {
        let chunks = self.documents.chunk(&document)?;

        let documents = &self.documents;
        let pending = &chunks;
        let entries = self
            .retry
            .run("embed document", move || documents.embed_chunks(pending))
            .await
            .map_err(surface)?;

        let dimension = entries.first().map(|(_, e)| e.dimension());
        let report = IngestReport::new(&document, entries.len(), dimension);
        session.install_document(document, entries)?;

        tracing::info!(chunks = report.chunks, chars = report.chars, "document indexed");
        Ok(report)
    }

    /// Document and index of a loaded session, so it can be restored later
    /// without embedding the document again.
    pub fn export_session(&self, session: &SessionState) -> Result<SessionSnapshot, DomainError> {
        match session.document() {
            Some(document) if session.is_ready() => Ok(SessionSnapshot {
                document: document.clone(),
                index: IndexSnapshot::capture(session.index()),
            }),
            _ => Err(DomainError::EmptyIndex),
        }
    }

    /// Installs an exported document and index. Vectors must have the width
    /// of the configured embedder and chunk offsets must lie inside the
    /// document. History restarts as with a fresh upload.
    #[instrument(skip(self, session, snapshot), fields(session_id = %session.id, source = %snapshot.document.source))]
    pub fn import_session(
        &self,
        session: &mut SessionState,
        snapshot: SessionSnapshot,
    ) -> Result<IngestReport, DomainError> {
        let expected = self.documents.dimension();
        if snapshot.index.dimension != expected {
            return Err(DomainError::validation(format!(
                "snapshot has dimension {}, embedder produces {expected}",
                snapshot.index.dimension
            )));
        }

        let document = snapshot.document;
        let entries = snapshot.index.into_entries()?;
        let chars = document.char_len();
        if let Some((chunk, _)) = entries
            .iter()
            .find(|(c, _)| c.start >= c.end || c.end > chars)
        {
            return Err(DomainError::validation(format!(
                "snapshot chunk {} spans {}-{}, document has {chars} chars",
                chunk.index, chunk.start, chunk.end
            )));
        }

        let report = IngestReport::new(&document, entries.len(), Some(expected));
        session.install_document(document, entries)?;

        tracing::info!(chunks = report.chunks, "session restored from snapshot");
        Ok(report)
    }

    pub fn clear_document(&self, session: &mut SessionState) -> Result<(), DomainError> {
        session.clear_document()
    }

    /// Starts a new conversation over the same document.
    pub fn new_chat(&self, session: &mut SessionState) {
        session.clear_history();
    }

    /// Answers one user turn.
    ///
    /// The user turn is recorded before any upstream call. The assistant turn
    /// is appended only when a complete answer came back; failed turns leave
    /// the user turn in place and return an error.
    #[instrument(skip(self, session, user_query), fields(session_id = %session.id))]
    pub async fn handle_turn(
        &self,
        session: &mut SessionState,
        user_query: &str,
    ) -> Result<String, DomainError> {
        let query = user_query.trim();
        if query.is_empty() {
            return Err(DomainError::validation("question must not be empty"));
        }
        if !session.is_ready() {
            return Err(DomainError::EmptyIndex);
        }

        let prior_turns = session.messages().len();
        session.record_user_turn(query);

        match self.answer(session, query, prior_turns).await {
            Ok(answer) => {
                session.record_assistant_turn(&answer);
                tracing::info!(chars = answer.chars().count(), "turn answered");
                Ok(answer)
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "turn failed");
                Err(surface(e))
            }
        }
    }

    /// Scored retrieval without generation, for inspecting what a question hits.
    pub async fn search(
        &self,
        session: &SessionState,
        query: &str,
        k: Option<usize>,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let rag = &self.rag;
        let index = session.index();
        let k = k.unwrap_or(rag.default_top_k());

        self.retry
            .run("search", move || rag.retrieve_scored(index, query, k))
            .await
            .map_err(surface)
    }

    async fn answer(
        &self,
        session: &SessionState,
        query: &str,
        prior_turns: usize,
    ) -> Result<String, DomainError> {
        let rag = &self.rag;
        let index: &dyn VectorIndex = session.index();
        let k = rag.default_top_k();

        let chunks = self
            .retry
            .run("retrieve", move || rag.retrieve(index, query, k))
            .await?;

        let history = &session.messages()[..prior_turns];
        let prompt = self.assembler.assemble(history, &chunks, query)?;
        tracing::debug!(
            chunks_used = prompt.chunks_used,
            turns_used = prompt.turns_used,
            "prompt assembled"
        );

        let mut request = CompletionRequest::new(prompt.text);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let llm = self.llm.as_ref();
        let request = &request;
        let response = self
            .retry
            .run("completion", move || llm.complete(request.clone()))
            .await?;

        let answer = response.text.trim().to_string();
        if answer.is_empty() {
            return Err(DomainError::upstream("model returned an empty answer"));
        }
        Ok(answer)
    }
}

/// Transient failures reach the caller as a single upstream error.
fn surface(e: DomainError) -> DomainError {
    match e {
        DomainError::EmbeddingService(msg) => {
            DomainError::upstream(format!("embedding service: {msg}"))
        }
        DomainError::Timeout(msg) => DomainError::upstream(format!("timed out: {msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ports::{CompletionResponse, EmbeddingRequest, EmbeddingResponse},
        MessageRole,
    };
    use crate::infrastructure::HashingEmbedding;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns queued outcomes in order and records every prompt it sees.
    #[derive(Default)]
    struct ScriptedLlm {
        outcomes: Mutex<Vec<Result<String, DomainError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn answering(answers: &[&str]) -> Self {
            Self {
                outcomes: Mutex::new(answers.iter().map(|a| Ok(a.to_string())).collect()),
                prompts: Mutex::default(),
            }
        }

        fn with_outcomes(outcomes: Vec<Result<String, DomainError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                prompts: Mutex::default(),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmService for ScriptedLlm {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, DomainError> {
            self.prompts.lock().unwrap().push(request.prompt);
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                return Err(DomainError::upstream("script exhausted"));
            }
            outcomes.remove(0).map(|text| CompletionResponse { text })
        }
    }

    /// Hashing embedder that can be switched into an outage.
    struct SwitchableEmbedding {
        inner: HashingEmbedding,
        down: AtomicBool,
        calls: AtomicUsize,
    }

    impl SwitchableEmbedding {
        fn new() -> Self {
            Self {
                inner: HashingEmbedding::new(256),
                down: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingService for SwitchableEmbedding {
        async fn embed_request(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(DomainError::embedding("connection refused"));
            }
            self.inner.embed_request(request).await
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.config.embedding.provider = "hashing".to_string();
        config.config.rag.chunk_size = 20;
        config.config.rag.chunk_overlap = 5;
        config.config.rag.top_k = 3;
        config.prompts.system = "Answer only from the context.".to_string();
        config
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2))
    }

    fn orchestrator(
        embedding: Arc<dyn EmbeddingService>,
        llm: Arc<dyn LlmService>,
    ) -> ChatOrchestrator {
        ChatOrchestrator::new(embedding, llm, &config())
            .unwrap()
            .with_retry(fast_retry())
    }

    fn sky() -> Document {
        Document::new("sky.txt", "The sky is blue. Grass is green.")
    }

    #[tokio::test]
    async fn test_handle_turn_grounds_prompt_and_records_turns() {
        let llm = Arc::new(ScriptedLlm::answering(&["The sky is blue."]));
        let chat = orchestrator(Arc::new(HashingEmbedding::new(256)), llm.clone());
        let mut session = chat.new_session();

        let report = chat.ingest_document(&mut session, sky()).await.unwrap();
        assert_eq!(report.chunks, 2);
        assert_eq!(report.chars, 32);
        assert_eq!(report.dimension, Some(256));

        let answer = chat
            .handle_turn(&mut session, "What color is the sky?")
            .await
            .unwrap();
        assert_eq!(answer, "The sky is blue.");

        let prompt = &llm.prompts()[0];
        let first_chunk = prompt
            .split("[1] (chars ")
            .nth(1)
            .and_then(|rest| rest.split("\n\n").next())
            .unwrap();
        assert!(first_chunk.contains("sky is blue"));
        assert!(prompt.starts_with("Answer only from the context."));
        assert!(prompt.ends_with("Question: What color is the sky?\nAnswer:"));

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "The sky is blue.");
    }

    #[tokio::test]
    async fn test_second_turn_sees_history() {
        let llm = Arc::new(ScriptedLlm::answering(&["Blue.", "Green."]));
        let chat = orchestrator(Arc::new(HashingEmbedding::new(256)), llm.clone());
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();

        chat.handle_turn(&mut session, "What color is the sky?").await.unwrap();
        chat.handle_turn(&mut session, "And the grass?").await.unwrap();

        let prompts = llm.prompts();
        assert!(!prompts[0].contains("Conversation so far:"));
        assert!(prompts[1].contains(
            "Conversation so far:\nUser: What color is the sky?\nAssistant: Blue."
        ));
        assert!(!prompts[1].contains("User: And the grass?"));
        assert_eq!(session.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_embedding_outage_surfaces_upstream_error() {
        let embedding = Arc::new(SwitchableEmbedding::new());
        let llm = Arc::new(ScriptedLlm::answering(&["never used"]));
        let chat = orchestrator(embedding.clone(), llm.clone());
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();

        embedding.down.store(true, Ordering::SeqCst);
        let calls_before = embedding.calls.load(Ordering::SeqCst);

        let result = chat.handle_turn(&mut session, "What color is the sky?").await;

        assert!(matches!(result, Err(DomainError::Upstream(_))));
        assert_eq!(embedding.calls.load(Ordering::SeqCst) - calls_before, 3);
        assert!(llm.prompts().is_empty());

        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "What color is the sky?");
    }

    #[tokio::test]
    async fn test_llm_retried_then_succeeds() {
        let llm = Arc::new(ScriptedLlm::with_outcomes(vec![
            Err(DomainError::upstream("503")),
            Err(DomainError::timeout("30s")),
            Ok("Blue.".to_string()),
        ]));
        let chat = orchestrator(Arc::new(HashingEmbedding::new(256)), llm.clone());
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();

        let answer = chat.handle_turn(&mut session, "Sky?").await.unwrap();

        assert_eq!(answer, "Blue.");
        assert_eq!(llm.prompts().len(), 3);
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_llm_failure_keeps_only_user_turn() {
        let llm = Arc::new(ScriptedLlm::with_outcomes(vec![
            Err(DomainError::timeout("gemini completion exceeded 30s")),
            Err(DomainError::timeout("gemini completion exceeded 30s")),
            Err(DomainError::timeout("gemini completion exceeded 30s")),
        ]));
        let chat = orchestrator(Arc::new(HashingEmbedding::new(256)), llm);
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();

        let err = chat.handle_turn(&mut session, "Sky?").await.unwrap_err();

        assert!(matches!(err, DomainError::Upstream(_)));
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_answer_is_a_failure() {
        let llm = Arc::new(ScriptedLlm::answering(&["   "]));
        let chat = orchestrator(Arc::new(HashingEmbedding::new(256)), llm)
            .with_retry(RetryPolicy::none());
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();

        let err = chat.handle_turn(&mut session, "Sky?").await.unwrap_err();

        assert!(matches!(err, DomainError::Upstream(_)));
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_question_before_upload_is_empty_index() {
        let chat = orchestrator(
            Arc::new(HashingEmbedding::new(256)),
            Arc::new(ScriptedLlm::default()),
        );
        let mut session = chat.new_session();

        let err = chat.handle_turn(&mut session, "Anything?").await.unwrap_err();

        assert!(matches!(err, DomainError::EmptyIndex));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let chat = orchestrator(
            Arc::new(HashingEmbedding::new(256)),
            Arc::new(ScriptedLlm::default()),
        );
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();

        let err = chat.handle_turn(&mut session, "  \n").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_failed_ingest_keeps_previous_document() {
        let embedding = Arc::new(SwitchableEmbedding::new());
        let chat = orchestrator(embedding.clone(), Arc::new(ScriptedLlm::default()));
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();

        embedding.down.store(true, Ordering::SeqCst);
        let err = chat
            .ingest_document(&mut session, Document::new("other.txt", "Completely different."))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Upstream(_)));
        assert_eq!(session.document().unwrap().source, "sky.txt");
        assert_eq!(session.index().len(), 2);
    }

    #[tokio::test]
    async fn test_new_document_resets_history() {
        let llm = Arc::new(ScriptedLlm::answering(&["Blue."]));
        let chat = orchestrator(Arc::new(HashingEmbedding::new(256)), llm);
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();
        chat.handle_turn(&mut session, "Sky?").await.unwrap();

        chat.ingest_document(&mut session, Document::new("b.txt", "Bees make honey."))
            .await
            .unwrap();

        assert!(session.messages().is_empty());
        assert_eq!(session.document().unwrap().source, "b.txt");
        assert_eq!(session.index().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_document_and_new_chat() {
        let llm = Arc::new(ScriptedLlm::answering(&["Blue."]));
        let chat = orchestrator(Arc::new(HashingEmbedding::new(256)), llm);
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();
        chat.handle_turn(&mut session, "Sky?").await.unwrap();

        chat.new_chat(&mut session);
        assert!(session.messages().is_empty());
        assert!(session.is_ready());

        chat.clear_document(&mut session).unwrap();
        assert!(!session.is_ready());
        assert!(matches!(
            chat.handle_turn(&mut session, "Sky?").await,
            Err(DomainError::EmptyIndex)
        ));
    }

    #[tokio::test]
    async fn test_search_returns_scored_chunks() {
        let chat = orchestrator(
            Arc::new(HashingEmbedding::new(256)),
            Arc::new(ScriptedLlm::default()),
        );
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();

        let results = chat.search(&session, "What color is the sky?", Some(1)).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].chunk.text.contains("sky is blue"));
        assert!(results[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_exported_session_restores_without_embedding() {
        let embedding = Arc::new(SwitchableEmbedding::new());
        let llm = Arc::new(ScriptedLlm::answering(&["Blue."]));
        let chat = orchestrator(embedding.clone(), llm.clone());

        let mut original = chat.new_session();
        chat.ingest_document(&mut original, sky()).await.unwrap();
        let snapshot = chat.export_session(&original).unwrap();
        assert_eq!(snapshot.index.entries.len(), 2);

        let embed_calls = embedding.calls.load(Ordering::SeqCst);
        let mut restored = chat.new_session();
        let report = chat.import_session(&mut restored, snapshot).unwrap();

        assert_eq!(report.chunks, 2);
        assert_eq!(embedding.calls.load(Ordering::SeqCst), embed_calls);
        assert_eq!(restored.document().unwrap().source, "sky.txt");

        let before = chat.search(&original, "What color is the sky?", None).await.unwrap();
        let after = chat.search(&restored, "What color is the sky?", None).await.unwrap();
        let ids = |rs: &[SearchResult]| rs.iter().map(|r| r.chunk.index).collect::<Vec<_>>();
        assert_eq!(ids(&before), ids(&after));

        let answer = chat.handle_turn(&mut restored, "What color is the sky?").await.unwrap();
        assert_eq!(answer, "Blue.");
    }

    #[tokio::test]
    async fn test_import_rejects_foreign_dimension() {
        let wide = orchestrator(Arc::new(HashingEmbedding::new(256)), Arc::new(ScriptedLlm::default()));
        let narrow = orchestrator(Arc::new(HashingEmbedding::new(64)), Arc::new(ScriptedLlm::default()));

        let mut session = wide.new_session();
        wide.ingest_document(&mut session, sky()).await.unwrap();
        let snapshot = wide.export_session(&session).unwrap();

        let mut target = narrow.new_session();
        assert!(matches!(
            narrow.import_session(&mut target, snapshot),
            Err(DomainError::Validation(_))
        ));
        assert!(!target.is_ready());
    }

    #[tokio::test]
    async fn test_import_rejects_chunks_outside_document() {
        let chat = orchestrator(Arc::new(HashingEmbedding::new(256)), Arc::new(ScriptedLlm::default()));
        let mut session = chat.new_session();
        chat.ingest_document(&mut session, sky()).await.unwrap();

        let mut snapshot = chat.export_session(&session).unwrap();
        snapshot.document = Document::new("short.txt", "The sky.");

        let mut target = chat.new_session();
        assert!(matches!(
            chat.import_session(&mut target, snapshot),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_export_without_document_is_empty_index() {
        let chat = orchestrator(Arc::new(HashingEmbedding::new(256)), Arc::new(ScriptedLlm::default()));
        let session = chat.new_session();
        assert!(matches!(
            chat.export_session(&session),
            Err(DomainError::EmptyIndex)
        ));
    }
}
