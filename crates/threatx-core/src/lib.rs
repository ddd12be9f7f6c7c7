//! Core types for the threatx client.
//!
//! Descriptor model and normalization, write-field names, client-side
//! mutation validation and time-expression parsing. This crate performs no
//! I/O; `threatx-client` layers HTTP on top of it.

pub mod descriptor;
pub mod error;
pub mod mutation;
pub mod post_param;
pub mod time;
pub mod validate;
pub mod window;

pub use error::{Error, Result};
