//! Workstation provisioning orchestrator.
//!
//! Brings a freshly installed machine to a configured developer workstation
//! by running a fixed sequence of idempotent modules, each isolated from the
//! failures of the others, with one dry-run switch honoured everywhere.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: TOML files under `conf/`, filtered by platform
//! - **[`resources`]**: idempotent `check + apply` primitives (packages, preferences, …)
//! - **[`modules`]**: the provisioning units, their descriptors and registry
//! - **[`selection`]**, **[`orchestrator`]**, **[`runner`]**, **[`report`]**: choosing,
//!   sequencing, isolating and summarising a run
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dry_run;
pub mod elevation;
pub mod error;
pub mod exec;
pub mod logging;
pub mod modules;
pub mod orchestrator;
pub mod platform;
pub mod report;
pub mod resources;
pub mod runner;
pub mod selection;
