//! Podprobe library - node-pinned diagnostic pods driven over exec streams

pub mod commands;
pub mod config;
pub mod k8s;
pub mod utils;
