//! Typed registry model for the Venus wire protocol generator.
//!
//! Parses the Vulkan API registry XML (plus private protocol-extension
//! XMLs) into a resolved, gated graph of [`ty::Type`]s, [`registry::Feature`]s
//! and [`registry::Extension`]s, ready for the planner crate to turn into
//! per-variable serialization plans.

pub mod config;
pub mod decl;
pub mod error;
pub mod gate;
pub mod registry;
pub mod ty;
pub mod variable;

pub use config::VenusConfig;
pub use decl::{Decl, Decor};
pub use error::{Result, VenusError};
pub use registry::{Extension, Feature, Registry};
pub use ty::{Category, Need, TypeRef, TypeTable};
pub use variable::{LenExpr, VarAttrs, Variable};
