//! Component D: the extension/feature gate.
//!
//! Dependency expressions (`A+B,(C+D)`) are parsed once into a small AST
//! (spec.md Design Notes: "do not pattern-match on strings in downstream
//! code") and evaluated against the enabled-extension set. The gate then
//! computes the in-scope type set and trims every `p_next` list down to
//! it.

use std::collections::BTreeSet;

use crate::config::VenusConfig;
use crate::registry::Registry;
use crate::ty::TypeRef;

/// `Leaf(name)` / `And(a, b)` / `Or(a, b)`, built from `+` (conjunction,
/// binds tighter) and `,` (disjunction) with `()` grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependsExpr {
    Leaf(String),
    And(Box<DependsExpr>, Box<DependsExpr>),
    Or(Box<DependsExpr>, Box<DependsExpr>),
}

impl DependsExpr {
    pub fn parse(expr: &str) -> DependsExpr {
        let or_terms: Vec<DependsExpr> = expr
            .split(',')
            .map(|term| {
                let term = term.trim().trim_matches(|c| c == '(' || c == ')');
                let and_terms: Vec<DependsExpr> = term
                    .split('+')
                    .map(|t| DependsExpr::Leaf(t.trim().trim_matches(|c| c == '(' || c == ')').to_string()))
                    .collect();
                and_terms.into_iter().reduce(DependsExpr::mk_and).unwrap_or(DependsExpr::Leaf(String::new()))
            })
            .collect();
        or_terms.into_iter().reduce(DependsExpr::mk_or).unwrap_or(DependsExpr::Leaf(String::new()))
    }

    fn mk_and(a: DependsExpr, b: DependsExpr) -> DependsExpr {
        DependsExpr::And(Box::new(a), Box::new(b))
    }

    fn mk_or(a: DependsExpr, b: DependsExpr) -> DependsExpr {
        DependsExpr::Or(Box::new(a), Box::new(b))
    }

    pub fn eval(&self, enabled: &BTreeSet<String>) -> bool {
        match self {
            DependsExpr::Leaf(name) => enabled.contains(name),
            DependsExpr::And(a, b) => a.eval(enabled) && b.eval(enabled),
            DependsExpr::Or(a, b) => a.eval(enabled) || b.eval(enabled),
        }
    }
}

/// `support_type_depends(expr)`: true iff some disjunct has every
/// conjunct present in the enabled set.
pub fn support_type_depends(expr: &str, enabled: &BTreeSet<String>) -> bool {
    DependsExpr::parse(expr).eval(enabled)
}

fn enabled_set(config: &VenusConfig) -> BTreeSet<String> {
    config.enabled_extensions.iter().cloned().collect()
}

/// The full in-scope type set: union of feature types, enabled extension
/// types, and optional-extension types whose dependency expression is
/// satisfied, closed under recursive dependency.
pub fn in_scope_types(reg: &Registry, config: &VenusConfig) -> Vec<TypeRef> {
    let enabled = enabled_set(config);
    let mut scope: Vec<TypeRef> = Vec::new();
    let mut push = |ty: &TypeRef, scope: &mut Vec<TypeRef>| {
        if !scope.contains(ty) {
            scope.push(ty.clone());
        }
    };

    for feat in &reg.features {
        for ty in &feat.types {
            push(ty, &mut scope);
        }
    }

    for ext in &reg.extensions {
        if !config.is_extension_enabled(&ext.name) {
            continue;
        }
        for ty in &ext.types {
            push(ty, &mut scope);
        }
        for (depends, types) in &ext.optional_types {
            if support_type_depends(depends, &enabled) {
                for ty in types {
                    push(ty, &mut scope);
                }
            }
        }
    }

    let mut closure = scope.clone();
    for ty in &scope {
        for dep in ty.dependencies() {
            if !closure.contains(&dep) {
                closure.push(dep);
            }
        }
    }

    tracing::info!(in_scope = closure.len(), roots = scope.len(), "gate resolved in-scope type set");
    closure
}

/// Trims every type's `p_next` list down to the in-scope set, in place.
pub fn filter_p_next(reg: &Registry, in_scope: &[TypeRef]) {
    for ty in reg.type_table.map.values() {
        let mut node = ty.0.borrow_mut();
        node.p_next.retain(|next_ty| in_scope.contains(next_ty));
    }
}
