// --- File: crates/tailortalk_gcal/src/lib.rs ---
pub mod auth;
pub mod doc;
pub mod handlers;
#[cfg(test)]
mod handlers_test;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod normalize;
pub mod routes;
pub mod service;
