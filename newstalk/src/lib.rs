// Library interface for newstalk modules
// This allows tests and other binaries to import modules

pub mod chat;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod server;
