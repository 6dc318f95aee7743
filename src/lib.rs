//! An on-demand launcher overlay for wlroots-style compositors: items come
//! from pluggable providers, are filtered as the user types and are drawn
//! into a layer-shell surface.

pub mod config;
pub mod error;
pub mod executor;
pub mod launcher;
pub mod matcher;
pub mod model;
pub mod providers;
pub mod registry;
pub mod state;
pub mod ui;
