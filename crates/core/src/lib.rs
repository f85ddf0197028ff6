//! Core domain for herald: configuration, tag diffing, and the tag
//! vocabulary that drives announcement copy.
//!
//! Everything in this crate is pure and synchronous. The Discord-facing
//! crate (`herald-discord`) layers event handling, debouncing, and I/O on
//! top of these types.

pub mod config;
pub mod tags;
pub mod vocabulary;

pub use config::{AppConfig, ConfigError, LoadOptions};
pub use tags::{highest_priority_added_action, same_tags, tag_added};
pub use vocabulary::{Grammar, KindCopy, StatusAction, TagVocabulary, ThreadKind};
