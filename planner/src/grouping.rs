//! Component H: grouping and emission planning.
//!
//! Partitions serializable commands (and the types they reach) across a
//! fixed, ordered list of named groups, keyed by a prefix match on the
//! command name with its `vk` prefix stripped. Grounded on
//! `GenStructsAndCommands.RULES` in the original `vn_protocol.py`: the
//! rule list there is matched in declaration order from the back, so a
//! later, more specific rule wins over an earlier, broader one.

use std::collections::BTreeSet;

use venus_protocol_model::TypeRef;

use crate::oracle::is_serializable_type;
use venus_protocol_model::VenusConfig;

/// Sentinel group for types with no direct command consumer.
pub const STRUCTS_GROUP: &str = "structs";
/// Sentinel group catching any command no named rule claims.
pub const TRANSPORT_GROUP: &str = "transport";

/// `(group name, prefixes that route to it)`, in the same order as the
/// original's per-object-type command families.
const RULES: &[(&str, &[&str])] = &[
    ("instance", &["CreateInstance", "DestroyInstance", "EnumerateInstance", "EnumeratePhysicalDevice", "GetPhysicalDevice"]),
    ("device", &["CreateDevice", "DestroyDevice", "GetDeviceQueue", "DeviceWaitIdle", "GetDeviceGroup"]),
    ("queue", &["QueueSubmit", "QueueWaitIdle", "QueueBindSparse", "GetQueue"]),
    ("fence", &["CreateFence", "DestroyFence", "ResetFences", "GetFenceStatus", "WaitForFences", "ImportFence", "GetFenceFd"]),
    ("semaphore", &["CreateSemaphore", "DestroySemaphore", "GetSemaphoreCounterValue", "WaitSemaphores", "SignalSemaphore", "ImportSemaphore", "GetSemaphoreFd"]),
    ("event", &["CreateEvent", "DestroyEvent", "GetEventStatus", "SetEvent", "ResetEvent"]),
    ("device_memory", &["AllocateMemory", "FreeMemory", "MapMemory", "UnmapMemory", "FlushMappedMemoryRanges", "InvalidateMappedMemoryRanges", "GetDeviceMemoryCommitment", "GetMemoryFdProperties"]),
    ("image", &["CreateImage", "DestroyImage", "GetImageSubresourceLayout", "BindImageMemory", "GetImageMemoryRequirements", "GetImageSparseMemoryRequirements", "GetImageDrmFormatModifierProperties"]),
    ("image_view", &["CreateImageView", "DestroyImageView"]),
    ("sampler", &["CreateSampler", "DestroySampler"]),
    ("sampler_ycbcr_conversion", &["CreateSamplerYcbcrConversion", "DestroySamplerYcbcrConversion"]),
    ("buffer", &["CreateBuffer", "DestroyBuffer", "BindBufferMemory", "GetBufferMemoryRequirements", "GetBufferDeviceAddress", "GetBufferOpaqueCaptureAddress"]),
    ("buffer_view", &["CreateBufferView", "DestroyBufferView"]),
    ("descriptor_pool", &["CreateDescriptorPool", "DestroyDescriptorPool", "ResetDescriptorPool"]),
    ("descriptor_set", &["AllocateDescriptorSets", "FreeDescriptorSets", "UpdateDescriptorSets"]),
    ("descriptor_set_layout", &["CreateDescriptorSetLayout", "DestroyDescriptorSetLayout", "GetDescriptorSetLayoutSupport"]),
    ("descriptor_update_template", &["CreateDescriptorUpdateTemplate", "DestroyDescriptorUpdateTemplate", "UpdateDescriptorSetWithTemplate"]),
    ("render_pass", &["CreateRenderPass", "DestroyRenderPass", "GetRenderAreaGranularity"]),
    ("framebuffer", &["CreateFramebuffer", "DestroyFramebuffer"]),
    ("query_pool", &["CreateQueryPool", "DestroyQueryPool", "GetQueryPoolResults", "ResetQueryPool"]),
    ("shader_module", &["CreateShaderModule", "DestroyShaderModule"]),
    ("pipeline", &["CreateGraphicsPipelines", "CreateComputePipelines", "DestroyPipeline", "GetPipelineExecutable"]),
    ("pipeline_layout", &["CreatePipelineLayout", "DestroyPipelineLayout"]),
    ("pipeline_cache", &["CreatePipelineCache", "DestroyPipelineCache", "GetPipelineCacheData", "MergePipelineCaches"]),
    ("command_pool", &["CreateCommandPool", "DestroyCommandPool", "ResetCommandPool", "TrimCommandPool"]),
    ("command_buffer", &["AllocateCommandBuffers", "FreeCommandBuffers", "ResetCommandBuffer", "BeginCommandBuffer", "EndCommandBuffer", "Cmd"]),
    ("private_data_slot", &["CreatePrivateDataSlot", "DestroyPrivateDataSlot", "GetPrivateData", "SetPrivateData"]),
    ("host_copy", &["CopyMemoryToImage", "CopyImageToMemory", "CopyImageToImage", "TransitionImageLayout"]),
    ("acceleration_structure", &["CreateAccelerationStructure", "DestroyAccelerationStructure", "GetAccelerationStructureBuildSizes", "GetAccelerationStructureDeviceAddress", "GetDeviceAccelerationStructureCompatibility", "WriteAccelerationStructuresProperties"]),
];

pub struct Group {
    pub name: String,
    pub commands: Vec<TypeRef>,
    pub structs: Vec<TypeRef>,
}

/// Strips the leading `vk` and routes to a group name by scanning `RULES`
/// from the back, so later (more specific) entries win.
fn group_for_command(command_name: &str) -> &'static str {
    let stripped = command_name.strip_prefix("vk").unwrap_or(command_name);
    for (group, prefixes) in RULES.iter().rev() {
        if prefixes.iter().any(|p| stripped.starts_with(p)) {
            return group;
        }
    }
    TRANSPORT_GROUP
}

/// Every type reachable from a command's parameters, return value, and
/// in-scope `p_next` targets.
fn reachable_types(cmd: &TypeRef) -> Vec<TypeRef> {
    let mut reached = Vec::new();
    let node = cmd.0.borrow();
    for var in &node.variables {
        for dep in var.ty.dependencies() {
            add_with_p_next(&dep, &mut reached);
        }
    }
    if let Some(ret) = &node.ret {
        for dep in ret.ty.dependencies() {
            add_with_p_next(&dep, &mut reached);
        }
    }
    reached
}

fn add_with_p_next(ty: &TypeRef, reached: &mut Vec<TypeRef>) {
    if reached.contains(ty) {
        return;
    }
    reached.push(ty.clone());
    for next_ty in ty.0.borrow().p_next.clone() {
        add_with_p_next(&next_ty, reached);
    }
}

/// Builds the group list, routing a type used by more than one group's
/// commands into the `structs` sentinel so it's emitted exactly once.
pub fn build_groups(in_scope_commands: &[TypeRef], config: &VenusConfig) -> Vec<Group> {
    let mut group_names: Vec<&str> = RULES.iter().map(|(n, _)| *n).collect();
    group_names.push(STRUCTS_GROUP);
    group_names.push(TRANSPORT_GROUP);

    let mut groups: Vec<Group> = group_names
        .iter()
        .map(|name| Group { name: name.to_string(), commands: Vec::new(), structs: Vec::new() })
        .collect();

    let mut type_owner_count: std::collections::HashMap<String, BTreeSet<String>> = std::collections::HashMap::new();
    let mut type_by_name: std::collections::HashMap<String, TypeRef> = std::collections::HashMap::new();

    for cmd in in_scope_commands {
        if !is_serializable_type(cmd, config) {
            continue;
        }
        let group = group_for_command(&cmd.name());
        let idx = groups.iter().position(|g| g.name == group).expect("group exists");
        groups[idx].commands.push(cmd.clone());

        for ty in reachable_types(cmd) {
            type_owner_count.entry(ty.name()).or_default().insert(group.to_string());
            type_by_name.insert(ty.name(), ty);
        }
    }

    let structs_idx = groups.iter().position(|g| g.name == STRUCTS_GROUP).unwrap();
    for (name, owners) in &type_owner_count {
        let ty = type_by_name.get(name).unwrap().clone();
        if owners.len() > 1 {
            groups[structs_idx].structs.push(ty);
        } else {
            let owner = owners.iter().next().unwrap();
            let idx = groups.iter().position(|g| &g.name == owner).unwrap();
            groups[idx].structs.push(ty);
        }
    }

    let non_empty = groups.iter().filter(|g| !g.commands.is_empty() || !g.structs.is_empty()).count();
    tracing::debug!(groups = non_empty, commands = in_scope_commands.len(), "command groups partitioned");
    groups
}
