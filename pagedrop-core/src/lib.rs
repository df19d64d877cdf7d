#![doc = "pagedrop-core: core logic library for pagedrop."]

//! This crate contains the publishing logic of pagedrop: turning local files and folders into
//! a fingerprinted file set, diffing it against a remote site, uploading through presigned
//! URLs and waiting for remote processing to converge.
//!
//! Transport is not included here: the remote API, object storage and time are reached
//! through the traits in [`contract`], implemented by the `pagedrop` binary and by mocks in
//! tests.
//!
//! # Modules
//! - [`path_resolver`]: markdown path → URL path
//! - [`discovery`], [`ignore_rules`], [`fingerprint`]: local file set
//! - [`planner`]: local vs. remote diff
//! - [`upload`], [`content_type`]: bounded-concurrency transfers
//! - [`convergence`]: processing-status polling
//! - [`publish`]: the end-to-end pipeline

pub mod config;
pub mod content_type;
pub mod contract;
pub mod convergence;
pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod ignore_rules;
pub mod path_resolver;
pub mod planner;
pub mod publish;
pub mod upload;

pub use error::{PublishError, PublishResult, RemoteError, TransferError};
