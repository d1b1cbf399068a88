// --- File: crates/tailortalk_agent/src/lib.rs ---
pub mod agent;
#[cfg(test)]
mod agent_test;
pub mod doc;
pub mod handlers;
pub mod llm;
pub mod routes;
pub mod tools;

pub use agent::{AgentError, CalendarAgent};
pub use tools::CalendarContext;
