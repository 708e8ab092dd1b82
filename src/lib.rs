//! Watdo Form - an interactive builder for `watdo todo` commands
//!
//! The form collects the todo fields, keeps a live command line in sync with
//! them, and copies it to the clipboard once the mandatory fields are filled.
//!
//! # Modules
//!
//! - [`form`]: Field specs, controls and the ordered registry
//! - [`command`]: Quoting rules and command serialization
//! - [`builder`]: Live command, trigger validation and the feedback state machine
//! - [`clipboard`]: Clipboard sinks (system and in-memory)
//! - [`config`]: Configuration management and serialization
//! - [`app`]: Interactive event loop
//! - [`batch`]: Building a command from `--set` arguments
//! - [`ui`]: Form rendering
//! - [`keybindings`]: Keyboard shortcut handling
//! - [`colors`]: 24-bit true color support

pub mod app;
pub mod batch;
pub mod builder;
pub mod clipboard;
pub mod colors;
pub mod command;
pub mod config;
pub mod error;
pub mod form;
pub mod keybindings;
pub mod ui;
