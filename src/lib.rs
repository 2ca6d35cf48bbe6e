//! Tarjuma - multi-model text translation router
//!
//! Routes translation requests across model families (IndicTrans2 for
//! English/Hindi/Urdu, OPUS-MT for English/Chinese), bridging pairs no single
//! family serves through a pivot language, and applies routed translation to
//! text, JSON and CSV documents.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod interactive;
pub mod language;
pub mod router;
pub mod translate;
pub mod workflow;
