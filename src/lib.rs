//! echocore: defensive toolkit for an on-device code assistant.
//!
//! Classifies incoming text for threats, rewrites risky Java-like source
//! patterns, explains build failures with platform-specific fixes, and keeps
//! an append-only audit trail of everything it does.
//!
//! See `DESIGN.md` for how the pieces fit together.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;

pub mod catalog;
pub mod guard;

pub mod diagnostics;
pub mod patch;

pub mod audit;
