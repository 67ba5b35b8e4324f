//! Integration tests for the hlx exchange dispatcher.
//!
//! These tests drive [`hlx_exchange::Exchange`] end to end against an
//! in-memory transport and a scripted market info provider.

pub mod common;
