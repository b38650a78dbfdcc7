//! Maestro Tools - Capability system
//!
//! This crate provides everything a worker needs to call capabilities:
//! - Registry: capability registration, lookup and per-worker subsets
//! - Schema: declared parameter types and pure argument coercion
//! - Invoker: lookup, coercion, timeout and failure capture
//! - Failure: classification of failures into retryable and fatal kinds
//! - Builtins: search, file, code and data capabilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod error;
pub mod failure;
pub mod invoker;
pub mod registry;
pub mod schema;

pub use builtins::{register_builtins, BuiltinsConfig};
pub use error::{Error, Result};
pub use failure::FailureKind;
pub use invoker::{
    outcome_to_json, CapabilityInvoker, InvocationError, InvocationOutcome, InvocationRecord,
    InvokerConfig,
};
pub use registry::{Tool, ToolCategory, ToolDefinition, ToolRegistry};
pub use schema::{coerce, coerce_arguments, ArgumentError, CoercionError, ParamSpec, ParamType};
