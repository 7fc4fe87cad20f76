//! Skinfaxi Hardware Abstraction Layer
//!
//! This crate provides the two fixed, immutable collections the gateway is
//! built on, and the trait that joins them:
//!
//! - A [`MetadataCatalog`] of read-only hardware descriptions
//!   ([`DeviceMetadata`]): topology, gate set, calibration averages.
//! - An [`ExecutorRegistry`] of pluggable execution engines implementing
//!   the [`Executor`] trait.
//!
//! A *virtual backend* is one `(device, executor)` pair, addressed as
//! `<device>@<executor>`. This crate knows nothing about that composite
//! name — composing, parsing, and resolving it is the scheduler crate's
//! job — it only guarantees that neither half ever contains the separator.
//!
//! # Example: a custom engine
//!
//! ```ignore
//! use skinfaxi_hal::{ExecOptions, Executor, ExecutorResult, Pub, ResultBlob};
//! use async_trait::async_trait;
//!
//! struct MyEngine;
//!
//! #[async_trait]
//! impl Executor for MyEngine {
//!     fn name(&self) -> &str { "my_engine" }
//!
//!     async fn execute_sampler(
//!         &self,
//!         pubs: &[Pub],
//!         options: &ExecOptions,
//!         device: &str,
//!     ) -> ExecutorResult<ResultBlob> {
//!         // Run the pubs against whatever this engine wraps.
//!         # todo!()
//!     }
//!
//!     async fn execute_estimator(
//!         &self,
//!         pubs: &[Pub],
//!         options: &ExecOptions,
//!         device: &str,
//!     ) -> ExecutorResult<ResultBlob> {
//!         # todo!()
//!     }
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod registry;

pub use catalog::MetadataCatalog;
pub use error::{HalError, HalResult};
pub use executor::{ExecOptions, Executor, ExecutorError, ExecutorResult, Pub, ResultBlob};
pub use metadata::{Calibration, DeviceMetadata, GateSet, Topology, TopologyKind};
pub use registry::ExecutorRegistry;
