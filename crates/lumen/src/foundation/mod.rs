//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and the orthographic projection
//! - Time sources for the frame loop
//! - Logging and the error router

pub mod math;
pub mod time;
pub mod logging;
