pub mod core;
pub mod history;
pub mod llm;
pub mod rag;
pub mod server;
pub mod services;
pub mod state;
