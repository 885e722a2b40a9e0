//! Build phase, retrieval and prompt assembly over the domain ports, plus
//! the per-session state those steps read and write.

pub mod services;
pub mod session;

pub use services::{AssembledPrompt, DocumentService, IngestReport, PromptAssembler, RagService};
pub use session::SessionState;
