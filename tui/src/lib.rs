//! chatbox TUI - Terminal interface for the chat widget
//!
//! A full-screen chat pane over the headless conductor: transcript on top,
//! input box below, a one-line status bar at the bottom.
//!
//! # Architecture
//!
//! - **ConductorClient**: picks the transcript shape at runtime and forwards
//!   to the conductor
//! - **Display**: turns the transcript into labelled, wrapped lines
//! - **Theme**: colors per message role
//! - **App**: event loop, key handling, rendering

pub mod app;
pub mod conductor_client;
pub mod display;
pub mod theme;

pub use app::App;
pub use conductor_client::ConductorClient;
