//! Discord integration - forum announcement bot interface
//!
//! This crate binds the herald core to Discord:
//! - **Gateway** (`gateway`) - event pump with reconnect policy
//! - **Events** (`events`) - thread created/updated dispatch, ping utility
//! - **Coordinator** (`coordinator`) - tag-update debounce and cooldown
//! - **Messages** (`messages`) - announcement and status-update copy
//! - **Embeds** (`embeds`) - typed embed/mention payload builders
//! - **REST** (`rest`) - channel fetch and message delivery over HTTP
//!
//! # Architecture
//!
//! ```text
//! Gateway Events → EventDispatcher → Handlers → TagUpdateCoordinator
//!                                       ↓              ↓ (debounced)
//!                                  DiscordApi ← Messages + Embeds
//! ```
//!
//! # Key Types
//!
//! - `GatewayRunner` - event loop with reconnection logic
//! - `EventDispatcher` - routes gateway events to handlers
//! - `TagUpdateCoordinator` - collapses tag-edit bursts, enforces cooldown
//! - `DiscordApi` - trait boundary for fetches and sends

pub mod api;
pub mod commands;
pub mod coordinator;
pub mod embeds;
pub mod events;
pub mod gateway;
pub mod messages;
pub mod rest;
