//! Business logic layer.
//!
//! This module contains the inspection pipeline (format/size validation,
//! duration extraction, duration policy) and the upload lifecycle
//! controller. Called by the host application; delegates HTTP interactions
//! to the `api` layer.

pub mod duration;
pub mod progress;
pub mod retry;
pub mod upload_engine;
pub mod validator;
