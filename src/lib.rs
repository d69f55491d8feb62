// lib.rs
pub mod aggregate;
pub mod associate;
pub mod cluster;
pub mod commands;
pub mod dominant;
pub mod error;
pub mod interval;
pub mod interval_index;
pub mod merge;
pub mod normalize;
pub mod record;
pub mod sample;
pub mod schema;
pub mod seqidx;
pub mod store;
pub mod table;

pub use error::{Result, TsrError};
