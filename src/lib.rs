//! Chat with a single document: chunk it, embed the chunks, retrieve the
//! passages closest to each question and ask an LLM to answer from them.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
