//! # cookbot-memory
//!
//! Cross-run memory for cookbot and the selection logic built on it.
//!
//! Memory is loaded once at the start of a run, mutated in place by the
//! pipeline, and saved once at the end.

pub mod diversity;
mod store;

pub use store::{
    MemoryStore, PollRecord, SessionMemory, INSIGHTS_FILE, MAIN_FILE, TRENDS_FILE,
};
