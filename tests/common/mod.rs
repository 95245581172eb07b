//! Shared fixtures for the integration tests.
//!
//! ```ignore
//! mod common;
//! use common::pdf::minimal_pdf;
//! ```
//!
//! `pdf` is also compiled into the library's unit tests.

pub mod pdf;
