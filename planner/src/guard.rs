//! Component I: the guard expression builder.
//!
//! Guards are a driver-only concept: only the driver negotiates peer
//! capabilities at runtime, so only it needs to check for them before
//! touching a type. For a type on the driver side, builds a boolean C
//! expression that evaluates to true when the type is *not* available
//! given the peer's negotiated capabilities — grounded on
//! `Gen.get_type_condition` in the original `vn_protocol.py`, which
//! returns `None` outright on the renderer side, then walks the same
//! three sources (core version, claiming extensions, optional-dependency
//! claims) and ANDs them together.

use venus_protocol_model::{config::Variant, Extension, Feature, Registry, TypeRef, VenusConfig};

/// Core API versions at or above which a guard is actually emitted;
/// anything promoted into 1.0–1.2 core is assumed universally available.
const MIN_GUARDED_FEATURE: &str = "1.3";

/// `None` means the type needs no guard (core ≤ 1.2, the Venus private
/// extension, or the renderer side, which never emits availability
/// guards at all).
pub fn build_guard(ty: &TypeRef, reg: &Registry, config: &VenusConfig) -> Option<String> {
    if config.variant != Variant::Driver {
        return None;
    }

    if let Some(feature) = owning_feature(ty, reg) {
        if feature.number.as_str() >= MIN_GUARDED_FEATURE {
            return Some(format!("!has_api_version({})", feature.number.replace('.', "_")));
        }
        return None;
    }

    let mut terms = Vec::new();
    for ext in claiming_extensions(ty, reg) {
        if is_venus_private(&ext.name) {
            return None;
        }
        terms.push(format!("!has_extension({})", ext.number));
    }

    for ext in &reg.extensions {
        for (depends, types) in &ext.optional_types {
            if types.contains(ty) {
                let clause = depends
                    .split('+')
                    .map(|dep| format!("has_extension({dep})"))
                    .collect::<Vec<_>>()
                    .join(" && ");
                terms.push(format!("!({clause})"));
            }
        }
    }

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" && "))
    }
}

fn owning_feature<'a>(ty: &TypeRef, reg: &'a Registry) -> Option<&'a Feature> {
    reg.features.iter().find(|f| f.types.contains(ty))
}

fn claiming_extensions<'a>(ty: &TypeRef, reg: &'a Registry) -> Vec<&'a Extension> {
    reg.extensions.iter().filter(|ext| ext.types.contains(ty)).collect()
}

fn is_venus_private(name: &str) -> bool {
    name == "VK_MESA_venus_protocol"
}
