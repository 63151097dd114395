//! scorm-localizer - SCORM course translation
//!
//! Imports SCORM packages, rewrites their on-screen text and narration into
//! another language using machine translation, speech recognition and speech
//! synthesis, and repackages the result for an LMS.

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod language;
pub mod manifest;
pub mod media;
pub mod metadata;
pub mod package;
pub mod progress;
pub mod rewrite;
pub mod setup;
pub mod synthesize;
pub mod transcribe;
pub mod translate;
pub mod workflow;
