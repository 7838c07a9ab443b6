//! spx backend library
//!
//! Generic entity query engine plus the asset and project repositories built
//! on it. The binary in `main.rs` is a thin one-shot CLI over this crate.

// Lets `#[derive(Entity)]` expand to `::spx_backend::...` paths inside this crate too.
extern crate self as spx_backend;

pub mod cli;
pub mod config;
pub mod db;

pub use spx_macros::Entity;
