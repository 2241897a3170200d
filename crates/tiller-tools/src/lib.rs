//! # tiller-tools
//!
//! The tool system for the Tiller agent engine:
//!
//! - **[`Tool`]**: the trait every tool implements — schema + async execute
//! - **[`ToolRegistry`]**: the ordered tool set a run dispatches against
//! - **[`SchemaBuilder`]** / **[`validate_arguments`]**: parameter schema
//!   declaration and dispatch-time argument validation
//!
//! Concrete tool implementations (filesystem, shell, browser, …) live in
//! downstream crates; this crate only defines the contract the engine
//! dispatches against.

#![deny(unsafe_code)]

pub mod errors;
pub mod registry;
pub mod schema;
pub mod traits;

pub use errors::ToolError;
pub use registry::ToolRegistry;
pub use schema::{validate_arguments, SchemaBuilder};
pub use traits::{Tool, ToolContext, UpdateSender};
