//! Core types shared across Rustack crates.
//!
//! This crate provides the foundational building blocks used by the
//! EventBridge configuration compiler: AWS account/region/partition types, a
//! fail-closed [`Arn`] parser, and the common error type.

mod arn;
mod error;
mod types;

pub use arn::Arn;
pub use error::{RustStackError, RustStackResult};
pub use types::{AccountId, AwsRegion, Partition};
