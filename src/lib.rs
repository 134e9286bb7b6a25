pub mod config;
pub mod cutter;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod paths;
pub mod pipeline;
pub mod writeback;
