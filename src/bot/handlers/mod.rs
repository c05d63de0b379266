//! Discord interaction handlers
//!
//! Buttons, select menus and modals are dispatched from [`components`];
//! [`render`] builds the embeds and components every command and handler sends.

/// Component and modal dispatch
pub mod components;
/// Embed and component builders
pub mod render;
