//! Core logic for crafter: line diffing, change highlighting, the indentation
//! pre-check, and the resilient submission protocol against the code service.
//!
//! Nothing in this crate knows about terminals. Editors and status messages are
//! reached through the traits in [`editor`].

pub mod diff;
pub mod editor;
pub mod error;
pub mod export;
pub mod highlight;
pub mod service;
pub mod submit;
pub mod syntax;
