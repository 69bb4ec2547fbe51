use venus_protocol_model::ty::Category;
use venus_protocol_model::Registry;

const FIXTURE: &str = include_str!("fixtures/mini_vk.xml");

fn load() -> Registry {
    Registry::parse(FIXTURE, &[]).expect("fixture should parse and resolve")
}

#[test]
fn s1_header_version_and_feature_present() {
    let reg = load();

    assert!(reg.features.iter().any(|f| f.number == "1.0"));
    let version = reg.vk_xml_version.expect("header version resolved");
    assert!(version.starts_with("VK_MAKE_API_VERSION("), "got {version:?}");
    assert!(reg.max_vk_command_type_value >= 0);
}

#[test]
fn type_table_bijection_for_base_types() {
    let reg = load();

    let instance = reg.type_table.get("VkInstance").expect("VkInstance present");
    assert_eq!(instance.name(), "VkInstance");
    assert_eq!(instance.category(), Some(Category::Handle));

    // alias maps to the exact same node
    let alias = reg.type_table.get("VkAllocationCallbacksEXT").expect("alias present");
    let base = reg.type_table.get("VkAllocationCallbacks").expect("base present");
    assert_eq!(alias, base);
}

#[test]
fn derived_pointer_type_shares_the_pointee_base() {
    let reg = load();

    let derived = reg.type_table.get("const void*").expect("derived pointer-to-const-void registered");
    assert_eq!(derived.category(), Some(Category::Derived));
    assert_eq!(derived.base().name(), "void");
    assert!(derived.is_pointer());
    assert_eq!(derived.indirection_depth(), 1);
}

#[test]
fn p_next_is_the_inverse_of_struct_extends() {
    let reg = load();

    let extends = reg.type_table.get("VkInstanceCreateInfo").expect("present");
    let extension = reg.type_table.get("VkValidationFeaturesEXT").expect("present");

    assert!(extends.0.borrow().p_next.contains(&extension));
}

#[test]
fn enum_value_aliases_resolve_in_one_pass() {
    let reg = load();

    let structure_type = reg.type_table.get("VkStructureType").expect("present");
    let node = structure_type.0.borrow();
    let enums = node.enums.as_ref().expect("enum values present");
    for val in enums.values.values() {
        assert!(!enums.values.contains_key(val), "{val:?} should have resolved to a terminal literal");
    }

    // VK_STRUCTURE_TYPE_APPLICATION_INFO_KHR2 -> ..._KHR -> VK_STRUCTURE_TYPE_APPLICATION_INFO -> "0",
    // a genuine two-hop chain; both intermediate links must collapse to the same terminal literal.
    assert_eq!(enums.values.get("VK_STRUCTURE_TYPE_APPLICATION_INFO_KHR").map(String::as_str), Some("0"));
    assert_eq!(enums.values.get("VK_STRUCTURE_TYPE_APPLICATION_INFO_KHR2").map(String::as_str), Some("0"));
}

#[test]
fn command_captures_device_lost_and_params() {
    let reg = load();

    let create_instance = reg.type_table.get("vkCreateInstance").expect("command present");
    let node = create_instance.0.borrow();
    assert_eq!(node.category, Some(Category::Command));
    assert_eq!(node.variables.len(), 3);
    assert_eq!(node.variables[0].name, "pCreateInfo");
    assert!(!node.can_device_lost);
}

#[test]
fn struct_s_type_literal_is_captured_from_first_member() {
    let reg = load();

    let info = reg.type_table.get("VkInstanceCreateInfo").expect("present");
    assert_eq!(
        info.0.borrow().s_type.as_deref(),
        Some("VK_STRUCTURE_TYPE_INSTANCE_CREATE_INFO")
    );
}

#[test]
fn base_out_structure_self_reference_does_not_trip_validation() {
    // Regression coverage for the pNext self-cycle (S6's model-side half);
    // loading must succeed despite VkBaseOutStructure.pNext : VkBaseOutStructure*.
    let reg = load();
    let base_out = reg.type_table.get("VkBaseOutStructure").expect("present");
    assert_eq!(base_out.base(), base_out);
}
