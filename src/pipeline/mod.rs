//! End-to-end decomposition pipeline.
//!
//! - [`DecompositionConfig`]: validated run configuration (builder or TOML)
//! - [`ScaleDecision`]: raw vs Box-Cox scale, decided from the λ interval
//! - [`DecompositionOrchestrator`]: single series or per-group runs with one
//!   imputation retry per failing group
//! - [`collate`]: long `(group, period, value)` table of one component

pub mod collate;
pub mod config;
pub mod decision;
pub mod imputation;
pub mod orchestrator;

pub use collate::{collate, collate_results, Component, ComponentRow};
pub use config::{DecompositionConfig, Scope};
pub use decision::ScaleDecision;
pub use imputation::{impute_zeros, zero_count};
pub use orchestrator::{
    DecompositionOrchestrator, DecompositionOutput, DecompositionResult, GroupFailure,
    GroupOutcome, GroupedDecomposition,
};
