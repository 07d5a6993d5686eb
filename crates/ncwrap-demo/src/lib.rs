#![forbid(unsafe_code)]

//! Interactive demos for the ncwrap wrappers.
//!
//! The binary drives [`app::App`] on the real terminal; tests drive the same
//! app against a headless engine.

pub mod app;
pub mod cli;
pub mod demos;
pub mod error;
pub mod logging;
