//! # Agroadmin Architecture
//!
//! Agroadmin is the back-office toolkit for an agribusiness directory: the
//! record lifecycle behind every admin screen (archive, recycle bin, purge),
//! bulk actions over a selection, contact import from spreadsheets and a few
//! geolocation helpers. It is a library with a CLI client on top.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The only place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Resolves collection names, caches table capabilities     │
//! │  - Normalizes inputs (indexes → selectors)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Resolves selectors against list views, runs bulk ops     │
//! │  - Returns CmdResult with records and messages              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Lifecycle Layer (lifecycle/, bulk.rs, import/)             │
//! │  - SoftDeletable over three storage models                  │
//! │  - Selection, optimistic removal and rollback               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Abstract RecordStore trait                               │
//! │  - FileStore (production), MemoryStore (testing)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Schemas Vary Per Table
//!
//! The backend grew table by table. Some tables carry a `status` column, some
//! only `deleted_at`, presentations move deleted rows into their own table,
//! and a few have neither. Nothing above the lifecycle layer branches on that:
//! [`capability`] probes each table once and [`lifecycle::Collection`] hands
//! out the matching [`lifecycle::SoftDeletable`].
//!
//! ## No I/O in the Core
//!
//! From `api.rs` inward, code takes Rust arguments, returns `Result<CmdResult>`
//! and never writes to stdout/stderr. The one exception is the purge
//! confirmation prompt, skipped with `--yes`.
//!
//! ## Testing Strategy
//!
//! 1. **Lifecycle and commands**: unit tests against [`store::memory::MemoryStore`],
//!    which counts calls per table and can fail writes on demand.
//! 2. **API**: dispatch and selector parsing.
//! 3. **CLI**: end-to-end runs of the binary in `tests/`.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: One module per command
//! - [`lifecycle`]: Collections, the three lifecycle models, degraded listings
//! - [`capability`]: Schema probing and the capability cache
//! - [`bulk`]: Selections, list views and batched bulk operations
//! - [`index`]: Display indexes (`1`, `a1`, `d1`)
//! - [`import`]: Spreadsheet reading and contact import
//! - [`geo`]: Distances and map links
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Rows, lifecycle records, shadow records
//! - [`config`]: Configuration and data directory resolution
//! - [`init`]: Builds the API context for a data directory
//! - [`error`]: Error types
//! - `cli`: Argument parsing and printing for the binary (not part of the lib API)

pub mod api;
pub mod bulk;
pub mod capability;
pub mod commands;
pub mod config;
pub mod error;
pub mod geo;
pub mod import;
pub mod index;
pub mod init;
pub mod lifecycle;
pub mod model;
pub mod store;
