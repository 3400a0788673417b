//! Test utilities for the halley workspace
//!
//! Provides a store builder for seeding `.env` fixtures on disk and a
//! scripted service controller that records call ordering, used by the
//! reconciliation tests.

pub mod helpers;

pub use helpers::{RecordingController, TestStoreBuilder};
