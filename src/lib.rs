//! In-memory wallet ledger with a deadlock-free concurrent transfer engine.

pub mod engine;
pub mod models;
pub mod storage;
pub mod types;
