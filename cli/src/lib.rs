//! taskboard-cli library - modules exposed for unit tests

pub mod board;
pub mod commands;
pub mod render;
