pub mod associate;
pub mod cluster;
pub mod dominant;
pub mod export;
pub mod import;
pub mod merge;
pub mod normalize;
pub mod stats;
