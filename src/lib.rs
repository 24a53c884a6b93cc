//! # Failbook
//!
//! Maintenance tooling for a community catalog of failed machine-learning
//! experiments. Submissions are markdown files with YAML front matter;
//! this crate validates them, flags near-duplicates, checks their links,
//! and regenerates the README index and the weekly digest.
//!
//! Duplicate scoring itself lives in the `failbook-core` crate, which has
//! no I/O; this crate adds file loading, configuration, and the CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Catalog constants (categories, required fields and sections) |
//! | [`submission`] | Front matter parsing and catalog discovery |
//! | [`validate`] | Submission validation rules |
//! | [`dedup`] | Duplicate-check reporting |
//! | [`links`] | Concurrent link checking |
//! | [`index`] | README index regeneration |
//! | [`digest`] | Weekly summary generation |
//! | [`telemetry`] | Tracing subscriber setup |

pub mod config;
pub mod dedup;
pub mod digest;
pub mod index;
pub mod links;
pub mod models;
pub mod submission;
pub mod telemetry;
pub mod validate;
