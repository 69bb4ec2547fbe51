//! Serialization planner for the Venus wire protocol generator.
//!
//! Consumes a resolved, gated [`venus_protocol_model::Registry`] and
//! produces the data a templating layer needs to emit C: which types are
//! serializable (E), a per-variable access plan (F), a stable command
//! opcode table (G), a group partition (H), and per-type availability
//! guards (I).

pub mod access_plan;
pub mod grouping;
pub mod guard;
pub mod opcode;
pub mod oracle;

pub use access_plan::{build_access_plan, AccessPlan, Allocation, Loop, LoopBound, Validity};
pub use grouping::{build_groups, Group, STRUCTS_GROUP, TRANSPORT_GROUP};
pub use guard::build_guard;
pub use opcode::{assign_opcodes, OpcodeTable};
pub use oracle::{is_serializable, is_serializable_type};
