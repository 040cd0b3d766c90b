//! Configuration for podprobe

pub mod settings;

pub use settings::Settings;
