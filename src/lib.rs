//! Purpose: Library crate for the `tablejson` codec, used by the CLI, tests, and embedders.
//! Exports: `api` (stable surface), `codec`, `core`, `interop`.
//! Role: Hosts the JSON superset codec over the dynamic table value model.
//! Invariants: Library code never installs a tracing subscriber; binaries own logging setup.
//! Invariants: Every fallible operation returns `core::error::Result`.
pub mod api;
pub mod codec;
pub mod core;
pub mod interop;
