//! Component G: command opcode assignment.
//!
//! Merges ids already present in the registry's `VkCommandTypeEXT` enum
//! with freshly allocated ids for commands (or aliases) that don't have
//! one yet, preserving every pre-existing value. Grounded on
//! `utils/print_vk_command_types.py`'s `gen_vk_command_types` pass, which
//! performs exactly this reuse-or-allocate merge while walking commands
//! in registry encounter order.

use indexmap::IndexMap;

use venus_protocol_model::{Registry, TypeRef, VenusError};

/// One name (command or alias) mapped to its stable opcode.
pub type OpcodeTable = IndexMap<String, i64>;

/// Builds the opcode table for a set of in-scope commands, in the order
/// given (callers pass features-then-extensions order to match the
/// original's `supported_types[VkType.COMMAND]` ordering).
pub fn assign_opcodes(
    reg: &Registry,
    commands: &[TypeRef],
) -> Result<OpcodeTable, VenusError> {
    let command_type_ty = reg
        .type_table
        .get("VkCommandTypeEXT")
        .ok_or_else(|| VenusError::MissingType { name: "VkCommandTypeEXT".to_string() })?;

    let existing: IndexMap<String, i64> = {
        let node = command_type_ty.0.borrow();
        let enums = node.enums.as_ref().ok_or_else(|| VenusError::InvariantViolation {
            detail: "VkCommandTypeEXT has no enum values".to_string(),
        })?;
        enums
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.trim_start_matches('+').parse::<i64>().unwrap_or(0)))
            .collect()
    };

    let mut table = OpcodeTable::new();
    let mut next_id = reg.max_vk_command_type_value + 1;

    for cmd in commands {
        let mut names = vec![cmd.name()];
        names.extend(cmd.0.borrow().aliases.iter().cloned());

        if names.iter().all(|name| table.contains_key(name)) {
            continue;
        }

        // Scan the whole name+aliases set before allocating: a command and
        // every one of its aliases share exactly one id, taken from the
        // first name among them already present in `VkCommandTypeEXT`.
        let id = names
            .iter()
            .find_map(|name| existing.get(&command_enum_name(reg, name)).copied())
            .unwrap_or_else(|| {
                let id = next_id;
                next_id += 1;
                tracing::trace!(name = names[0].as_str(), id, "allocated new opcode");
                id
            });

        for name in names.drain(..) {
            table.insert(name, id);
        }
    }

    // Uniqueness holds per distinct command, not per name: a command and its
    // aliases deliberately share one id, so dedup by primary name first.
    let mut primary_ids: Vec<i64> = commands.iter().filter_map(|cmd| table.get(&cmd.name()).copied()).collect();
    let primary_count = primary_ids.len();
    primary_ids.sort_unstable();
    primary_ids.dedup();
    if primary_ids.len() != primary_count {
        return Err(VenusError::OpcodeMismatch { expected: primary_count, actual: primary_ids.len() });
    }

    tracing::debug!(commands = table.len(), next_id, "opcode table assigned");
    Ok(table)
}

/// `vkCreateInstance` → `VK_COMMAND_TYPE_vkCreateInstance_EXT`, the naming
/// convention `VkCommandTypeEXT` values follow in the registry.
fn command_enum_name(_reg: &Registry, command_name: &str) -> String {
    format!("VK_COMMAND_TYPE_{command_name}_EXT")
}
