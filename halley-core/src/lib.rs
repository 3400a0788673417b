//! Core library for Halley, an operations tool for a containerized
//! sequencer node.
//!
//! This crate owns the reconciliation cycle between operator input, the
//! on-disk configuration (a line-oriented `.env` store plus a compose-style
//! manifest), and the running service:
//! - `envfile` - the ordered `KEY=VALUE` store with in-place upsert
//! - `backup` - timestamped backup copies taken before every mutation
//! - `manifest` - typed, wholesale regeneration of the service manifest
//! - `runner` - the external compose CLI, invoked with captured output
//! - `reconcile` - stop/start sequencing with bounded liveness polling
//! - `admin` - the node's local JSON-RPC admin endpoint
//!
//! The binary crate (`halley-cli`) wires these together into the
//! `install` / `configure` / `update` / `remove` operations.

pub mod admin;
pub mod backup;
pub mod context;
pub mod envfile;
pub mod errors;
pub mod manifest;
pub mod reconcile;
pub mod runner;
pub mod schema;

mod fsio;
