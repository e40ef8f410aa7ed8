//! Data models for the session-audio upload pipeline.
//!
//! This module contains the shared data structure definitions used across
//! the crate: the blob abstraction, validation/duration verdicts, upload
//! lifecycle state, and the host-tunable policy.

pub mod blob;
pub mod policy;
pub mod upload;
pub mod verdict;
