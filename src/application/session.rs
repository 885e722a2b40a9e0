use uuid::Uuid;

use crate::domain::{
    ports::VectorIndex, Chunk, Conversation, Document, DomainError, Embedding, Message,
    MessageRole,
};

/// Everything one chat session owns: the loaded document, its index and the
/// conversation. Callers hold it and pass it into each turn; nothing here is
/// shared between sessions.
pub struct SessionState {
    pub id: Uuid,
    document: Option<Document>,
    index: Box<dyn VectorIndex>,
    history: Conversation,
}

impl SessionState {
    pub fn new(index: Box<dyn VectorIndex>) -> Self {
        Self {
            id: Uuid::new_v4(),
            document: None,
            index,
            history: Conversation::new(),
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    pub fn messages(&self) -> &[Message] {
        &self.history.messages
    }

    /// A document is loaded and its index has entries.
    pub fn is_ready(&self) -> bool {
        self.document.is_some() && !self.index.is_empty()
    }

    /// Swaps in a new document and rebuilds the index from scratch. The
    /// conversation restarts because earlier turns refer to the old document.
    /// On error the previous document and index are left untouched.
    pub fn install_document(
        &mut self,
        document: Document,
        entries: Vec<(Chunk, Embedding)>,
    ) -> Result<(), DomainError> {
        self.index.build(entries)?;
        self.document = Some(document);
        self.history.reset();
        Ok(())
    }

    pub fn clear_document(&mut self) -> Result<(), DomainError> {
        self.index.build(Vec::new())?;
        self.document = None;
        self.history.reset();
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.history.reset();
    }

    pub(crate) fn record_user_turn(&mut self, content: &str) {
        self.history.push(MessageRole::User, content);
    }

    pub(crate) fn record_assistant_turn(&mut self, content: &str) {
        self.history.push(MessageRole::Assistant, content);
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("id", &self.id)
            .field("document", &self.document.as_ref().map(|d| &d.source))
            .field("indexed_chunks", &self.index.len())
            .field("turns", &self.history.len())
            .finish()
    }
}
