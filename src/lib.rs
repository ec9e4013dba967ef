//! `pylower` library crate.
//!
//! Python-to-ThIR lowering frontend for a symbolic tensor-shape analyzer.
//! High-level layout:
//! - input model: `ast` (host-parser syntax tree) + `span` (positions)
//! - output model: `thir` (the statement/expression IR the backend explores)
//! - translation: `lower` (per-node dispatch and desugaring) + `names`
//!   (binding scans, qualified-path resolution, operator mapping)
//! - drivers: `collect` (directory walk over stub library and project),
//!   `resolve` (module lookup for symbolic import), `config`
pub mod ast;
pub mod collect;
pub mod config;
pub mod lower;
pub mod names;
pub mod resolve;
pub mod span;
pub mod thir;
