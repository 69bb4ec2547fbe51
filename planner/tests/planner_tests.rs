use std::collections::BTreeSet;

use venus_protocol_model::{Registry, VenusConfig};
use venus_protocol_planner::{assign_opcodes, build_groups, is_serializable, is_serializable_type};

const FIXTURE: &str = include_str!("fixtures/mini_vk.xml");

fn load() -> Registry {
    Registry::parse(FIXTURE, &[]).expect("fixture should parse and resolve")
}

#[test]
fn dependency_expression_and_or_precedence() {
    let mut enabled = BTreeSet::new();
    enabled.insert("A".to_string());
    enabled.insert("B".to_string());

    assert!(venus_protocol_model::gate::support_type_depends("A+B", &enabled));
    assert!(!venus_protocol_model::gate::support_type_depends("A+C", &enabled));
    assert!(venus_protocol_model::gate::support_type_depends("A,C", &enabled));
    assert!(!venus_protocol_model::gate::support_type_depends("C,D", &enabled));
}

#[test]
fn serializability_monotonicity_over_instance_create_info() {
    let reg = load();
    let config = VenusConfig::default();

    let info = reg.type_table.get("VkInstanceCreateInfo").expect("present");
    if is_serializable_type(&info, &config) {
        for var in &info.0.borrow().variables {
            if var.maybe_null() || var.is_p_next() {
                continue;
            }
            assert!(
                is_serializable(var, &config),
                "{} should be serializable because its owner is",
                var.name
            );
        }
    }
}

#[test]
fn blob_member_serializability_depends_on_its_own_length_expression() {
    let reg = load();
    let config = VenusConfig::default();

    let with_len = reg.type_table.get("VkTestBlobWithLen").expect("present");
    assert!(is_serializable_type(&with_len, &config));

    let without_len = reg.type_table.get("VkTestBlobWithoutLen").expect("present");
    assert!(
        !is_serializable_type(&without_len, &config),
        "a void* member with no length expression is not a blob and can't be serialized"
    );
}

#[test]
fn opcode_stability_reuses_existing_ids() {
    let reg = load();
    let create_instance = reg.type_table.get("vkCreateInstance").expect("present");

    let table = assign_opcodes(&reg, &[create_instance]).expect("opcode assignment");
    assert_eq!(table.get("vkCreateInstance").copied(), Some(0));
}

#[test]
fn aliased_command_shares_a_single_opcode_with_its_alias() {
    let reg = load();
    let base = reg.type_table.get("vkEnumeratePhysicalDeviceGroups").expect("present");

    let table = assign_opcodes(&reg, &[base]).expect("opcode assignment");
    let base_id = table.get("vkEnumeratePhysicalDeviceGroups").copied();
    let alias_id = table.get("vkEnumeratePhysicalDeviceGroupsKHR").copied();

    assert!(base_id.is_some());
    assert_eq!(base_id, alias_id, "a command and its alias must resolve to one shared id");
    assert_eq!(base_id, Some(7), "the id already present in VkCommandTypeEXT must be reused");
}

#[test]
fn group_partition_places_every_serializable_command_exactly_once() {
    let reg = load();
    let config = VenusConfig::default();

    let create_instance = reg.type_table.get("vkCreateInstance").expect("present");
    let groups = build_groups(&[create_instance.clone()], &config);

    let owners: Vec<_> = groups.iter().filter(|g| g.commands.contains(&create_instance)).collect();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].name, "instance");
}
