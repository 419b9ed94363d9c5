//! Integration tests for Fernway.
//!
//! This crate exists to host cross-crate tests in its `tests/` directory;
//! the library itself is empty.

#![cfg_attr(not(test), forbid(unsafe_code))]
