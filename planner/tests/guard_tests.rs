use venus_protocol_model::config::Variant;
use venus_protocol_model::{Registry, VenusConfig};
use venus_protocol_planner::build_guard;

const FIXTURE: &str = include_str!("fixtures/mini_vk.xml");

fn load() -> Registry {
    Registry::parse(FIXTURE, &[]).expect("fixture should parse and resolve")
}

#[test]
fn renderer_side_never_emits_a_guard() {
    let reg = load();
    let mut config = VenusConfig::default();
    config.variant = Variant::Renderer;

    let ty = reg.type_table.get("VkValidationFeaturesEXT").expect("present");
    assert_eq!(build_guard(&ty, &reg, &config), None);
}

#[test]
fn driver_side_guards_an_extension_claimed_type() {
    let reg = load();
    let mut config = VenusConfig::default();
    config.variant = Variant::Driver;

    let ty = reg.type_table.get("VkValidationFeaturesEXT").expect("present");
    let guard = build_guard(&ty, &reg, &config).expect("extension-claimed type needs a guard");
    assert!(guard.contains("has_extension"));
}

#[test]
fn core_feature_type_needs_no_guard_on_the_driver_side() {
    let reg = load();
    let mut config = VenusConfig::default();
    config.variant = Variant::Driver;

    let ty = reg.type_table.get("VkInstanceCreateInfo").expect("present");
    assert_eq!(build_guard(&ty, &reg, &config), None, "VK_VERSION_1_0 is below the guarded threshold");
}
