//! Component E: the serializability oracle.
//!
//! `is_serializable` is a recursive predicate over the type graph. It
//! never mutates anything and has no memory between calls — callers that
//! need memoization (component H's reachability walk) keep their own
//! cache keyed by type identity.

use venus_protocol_model::{Category, TypeRef, Variable, VenusConfig};

/// Structs excluded regardless of member shape: the untagged base classes
/// of the `pNext` chain itself, which have no serializable form of their
/// own (every concrete extension struct is what actually gets walked).
const STRUCT_BLOCK_LIST: &[&str] = &["VkBaseInStructure", "VkBaseOutStructure"];

pub fn is_serializable(var: &Variable, config: &VenusConfig) -> bool {
    let base = var.ty.base();
    match base.category() {
        None => false,
        Some(Category::Include) | Some(Category::Define) | Some(Category::FuncPointer) => false,
        Some(Category::Default) => {
            let name = base.name();
            if name == "void" {
                return var.is_blob();
            }
            is_fixed_primitive(&name)
        }
        Some(Category::Handle) | Some(Category::Enum) | Some(Category::Bitmask) => true,
        Some(Category::Union) => base.is_valid_union() || config.union_default_tag(&base.name()).is_some(),
        Some(Category::Struct) => {
            let name = base.name();
            if STRUCT_BLOCK_LIST.contains(&name.as_str()) {
                return false;
            }
            base.0
                .borrow()
                .variables
                .iter()
                .all(|member| member.maybe_null() || member.is_p_next() || is_serializable(member, config))
        }
        Some(Category::Command) => {
            let name = base.name();
            if config.is_command_blocked(&name) {
                return false;
            }
            let node = base.0.borrow();
            let ret_ok = node.ret.as_ref().map_or(true, |ret: &Variable| is_serializable(ret, config));
            ret_ok && node.variables.iter().all(|member| is_serializable(member, config))
        }
        Some(Category::Derived) => unreachable!("base() never returns a Derived node"),
    }
}

/// The original dispatches on `isinstance(var, VkType)` and recurses with
/// a throwaway `VkVariable(var)` wrapper; Rust has no such runtime check,
/// so callers holding a bare `TypeRef` (a whole struct or command, not one
/// of its members) go through this instead.
pub fn is_serializable_type(ty: &TypeRef, config: &VenusConfig) -> bool {
    is_serializable(&Variable::new(ty.clone(), String::new()), config)
}

fn is_fixed_primitive(name: &str) -> bool {
    matches!(
        name,
        "int8_t"
            | "uint8_t"
            | "int16_t"
            | "uint16_t"
            | "int32_t"
            | "uint32_t"
            | "int64_t"
            | "uint64_t"
            | "float"
            | "double"
            | "char"
            | "size_t"
    )
}
