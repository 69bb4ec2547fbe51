use venus_protocol_model::{Registry, VenusConfig};
use venus_protocol_planner::{build_access_plan, Allocation, LoopBound, Validity};

const FIXTURE: &str = include_str!("fixtures/mini_vk.xml");

fn load() -> Registry {
    Registry::parse(FIXTURE, &[]).expect("fixture should parse and resolve")
}

fn var_named<'a>(owner: &'a venus_protocol_model::TypeRef, name: &str) -> venus_protocol_model::Variable {
    owner
        .0
        .borrow()
        .variables
        .iter()
        .find(|v| v.name == name)
        .cloned()
        .unwrap_or_else(|| panic!("{name} not found on {}", owner.name()))
}

#[test]
fn create_instance_params_split_valid_and_partial() {
    let reg = load();
    let config = VenusConfig::default();
    let cmd = reg.type_table.get("vkCreateInstance").expect("present");

    let create_info = var_named(&cmd, "pCreateInfo");
    let plan = build_access_plan(&cmd, &create_info, true, false, &config);
    assert_eq!(plan.validity, Validity::Valid);
    assert!(plan.loops.is_empty());

    let out_instance = var_named(&cmd, "pInstance");
    let plan = build_access_plan(&cmd, &out_instance, false, false, &config);
    assert_eq!(plan.validity, Validity::Partial);
    assert_eq!(plan.allocation, Allocation::ScratchArena);
}

#[test]
fn enumerate_physical_devices_count_is_the_sibling_length() {
    let reg = load();
    let config = VenusConfig::default();
    let cmd = reg.type_table.get("vkEnumeratePhysicalDevices").expect("present");

    let count = var_named(&cmd, "pPhysicalDeviceCount");
    let count_plan = build_access_plan(&cmd, &count, false, true, &config);
    assert_eq!(count_plan.validity, Validity::Valid);

    let devices = var_named(&cmd, "pPhysicalDevices");
    let devices_plan = build_access_plan(&cmd, &devices, false, false, &config);
    assert_eq!(devices_plan.loops.len(), 1);
    match &devices_plan.loops[0].bound {
        LoopBound::Sibling { principal_name, guarded } => {
            assert_eq!(principal_name, "pPhysicalDeviceCount");
            assert!(guarded, "the length sibling is itself a pointer parameter");
        }
        other => panic!("expected a sibling-length loop, got {other:?}"),
    }
}

#[test]
fn image_create_info_queue_family_indices_carries_the_ignorable_condition() {
    let reg = load();
    let config = VenusConfig::default();
    let owner = reg.type_table.get("VkImageCreateInfo").expect("present");

    let indices = var_named(&owner, "pQueueFamilyIndices");
    let plan = build_access_plan(&owner, &indices, true, false, &config);
    assert_eq!(
        plan.condition.as_deref(),
        Some("val->sharingMode == VK_SHARING_MODE_CONCURRENT")
    );
}

#[test]
fn null_terminated_string_member_unrolls_into_an_array_call() {
    let reg = load();
    let config = VenusConfig::default();
    let owner = reg.type_table.get("VkApplicationInfo").expect("present");

    let name = var_named(&owner, "pApplicationName");
    let plan = build_access_plan(&owner, &name, true, false, &config);
    assert!(plan.unrolled);
    assert!(plan.func_stem.ends_with("_array"));
    assert_eq!(plan.array_size.as_deref(), Some("string_size"));
    assert_eq!(plan.string_size.as_deref(), Some("string_size"));
    assert!(plan.loops.is_empty());
}

#[test]
fn multi_segment_length_chain_forces_a_guard_even_off_a_non_pointer_member() {
    let reg = load();
    let config = VenusConfig::default();
    let cmd = reg.type_table.get("vkGetAccelerationStructureBuildSizesKHR").expect("present");

    let counts = var_named(&cmd, "pMaxPrimitiveCounts2");
    let plan = build_access_plan(&cmd, &counts, false, false, &config);
    assert_eq!(plan.loops.len(), 1);
    match &plan.loops[0].bound {
        LoopBound::Sibling { principal_name, guarded } => {
            assert_eq!(principal_name, "pBuildInfo->geometryCount");
            assert!(guarded, "a->b chains must guard even though geometryCount itself isn't a pointer");
        }
        other => panic!("expected a sibling-length loop, got {other:?}"),
    }
}

#[test]
fn build_range_infos_is_exempt_from_the_multi_segment_guard() {
    let reg = load();
    let config = VenusConfig::default();
    let cmd = reg.type_table.get("vkBuildAccelerationStructuresKHR").expect("present");

    let ranges = var_named(&cmd, "ppBuildRangeInfos");
    let plan = build_access_plan(&cmd, &ranges, false, false, &config);
    assert_eq!(plan.loops.len(), 2);
    match &plan.loops[1].bound {
        LoopBound::Sibling { principal_name, guarded } => {
            assert_eq!(principal_name, "pInfos[i].geometryCount");
            assert!(!guarded, "ppBuildRangeInfos is exempt from the synthetic chain's guard");
        }
        other => panic!("expected a sibling-length loop, got {other:?}"),
    }
}

#[test]
fn base_out_structure_short_circuits_its_own_self_referential_p_next() {
    let reg = load();
    let base_out = reg.type_table.get("VkBaseOutStructure").expect("present");

    // The pNext member's type is VkBaseOutStructure itself; set_need must
    // not recurse into it (it would otherwise loop forever), so it never
    // even flips VkBaseOutStructure's own flag.
    let p_next_var = var_named(&base_out, "pNext");
    assert_eq!(p_next_var.ty.base().name(), "VkBaseOutStructure");

    base_out.set_need(venus_protocol_model::Need::Encode, true);
    assert!(!base_out.0.borrow().need_encode);
}
