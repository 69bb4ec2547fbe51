//! Component F: the variable access planner.
//!
//! Produces an [`AccessPlan`] per struct member / command parameter:
//! validity, the ordered access loops implied by its length expressions,
//! whether the innermost loop unrolls into a primitive-array call, and
//! the allocation strategy the decode side needs. This is the largest
//! component by design (spec.md budgets it at ~30% of the core) — most of
//! the original generator's branching lives in the equivalent Python
//! pass over `VkVariable`.

use venus_protocol_model::{Category, TypeRef, VenusConfig, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Fully initialized by the caller at this point on the wire.
    Valid,
    /// Produced entirely by the callee; only a placeholder crosses in.
    Invalid,
    /// Shape known, but handle id / `sType` / `pNext` contents are filled
    /// in by the callee.
    Partial,
}

/// How a single length-expression entry turns into a loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopBound {
    /// `strlen(<var>) + 1`.
    NullTerminated,
    /// Iterate over a sibling field; `guarded` is set when the sibling
    /// itself is a pointer and the loop must be skipped when it's null.
    Sibling { principal_name: String, guarded: bool },
    /// Iterate `0..expr` as a plain 32-bit unsigned bound.
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    pub iterator: String,
    pub bound: LoopBound,
}

/// What the decode side must do to materialize storage for one pointer
/// level before writing into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    None,
    /// Pull from the scratch arena; a null result short-circuits decode.
    ScratchArena,
    /// Blobs come from an externally supplied output window instead.
    BlobStorage,
}

#[derive(Debug, Clone)]
pub struct AccessPlan {
    pub validity: Validity,
    pub loops: Vec<Loop>,
    /// Set when the innermost loop was removed because it walks a scalar
    /// element type; the emitter then calls `<stem>_array` once over
    /// `array_size` elements instead of looping.
    pub unrolled: bool,
    pub func_stem: String,
    pub array_size: Option<String>,
    pub allocation: Allocation,
    pub selector: Option<String>,
    pub string_size: Option<String>,
    pub condition: Option<String>,
    pub stride: Option<String>,
}

const ITER_NAMES: &[&str] = &["i", "j", "k", "l", "m", "n"];

/// Builds the plan for one member/parameter. `sibling_in_out` reports
/// whether some other variable's length expression names this one (the
/// variable then also counts as VALID even though it might otherwise be
/// produced by the callee).
pub fn build_access_plan(
    owner: &TypeRef,
    var: &Variable,
    fully_initialized: bool,
    is_in_out_length: bool,
    config: &VenusConfig,
) -> AccessPlan {
    let validity = assign_validity(var, fully_initialized, is_in_out_length);
    let mut loops = build_loops(owner, var);

    let mut unrolled = false;
    let mut array_size = None;
    if let Some(last) = loops.last() {
        if let LoopBound::Expression(expr) = &last.bound {
            if innermost_element_is_scalar(var) {
                array_size = Some(expr.clone());
                loops.pop();
                unrolled = true;
            }
        } else if matches!(&last.bound, LoopBound::NullTerminated) && innermost_element_is_scalar(var) {
            array_size = Some("string_size".to_string());
            loops.pop();
            unrolled = true;
        }
    }
    if var.ty.is_static_array() && innermost_element_is_scalar(var) {
        if let Some(dim) = var.ty.static_array_size() {
            array_size = Some(dim);
            unrolled = true;
            loops.clear();
        }
    }

    let func_stem = if unrolled {
        format!("{}_array", base_func_stem(var))
    } else {
        base_func_stem(var)
    };

    let allocation = if var.ty.is_pointer() {
        if var.is_blob() {
            Allocation::BlobStorage
        } else if matches!(validity, Validity::Invalid | Validity::Partial) {
            Allocation::ScratchArena
        } else {
            Allocation::None
        }
    } else {
        Allocation::None
    };

    let attrs = var.attrs.borrow();
    let selector = attrs.selector.clone();
    let string_size = if var.has_c_string() { Some("string_size".to_string()) } else { None };
    let condition = attrs.condition.clone().or_else(|| ignorable_condition(owner, var, config));
    let stride = attrs.stride.clone();

    AccessPlan {
        validity,
        loops,
        unrolled,
        func_stem,
        array_size,
        allocation,
        selector,
        string_size,
        condition,
        stride,
    }
}

fn assign_validity(var: &Variable, fully_initialized: bool, is_in_out_length: bool) -> Validity {
    if fully_initialized || is_in_out_length {
        return Validity::Valid;
    }
    match var.ty.base().category() {
        Some(Category::Handle) | Some(Category::Struct) => Validity::Partial,
        _ => Validity::Invalid,
    }
}

fn build_loops(owner: &TypeRef, var: &Variable) -> Vec<Loop> {
    let mut loops = Vec::new();

    if var.ty.is_static_array() {
        if let Some(dim) = var.ty.static_array_size() {
            loops.push(Loop { iterator: next_iter(0), bound: LoopBound::Expression(dim) });
        }
        return loops;
    }

    let len_exprs = var.attrs.borrow().len_exprs.clone();
    for (depth, len_expr) in len_exprs.iter().enumerate() {
        let iterator = next_iter(depth);
        if len_expr.is_null_terminated() {
            loops.push(Loop { iterator, bound: LoopBound::NullTerminated });
            continue;
        }

        let siblings = owner.find_variables(&len_expr.principal_name);
        if let Some(sibling) = siblings.last() {
            let mut guarded = sibling.ty.is_pointer() || is_multi_segment(&len_expr.principal_name);
            if is_guard_exempt(&var.name) {
                guarded = false;
            }
            loops.push(Loop {
                iterator,
                bound: LoopBound::Sibling { principal_name: len_expr.principal_name.clone(), guarded },
            });
        } else {
            loops.push(Loop { iterator, bound: LoopBound::Expression(len_expr.expr.clone()) });
        }
    }

    loops
}

/// `a->b` or `a[i].b`: the length expression walks through another
/// struct's members rather than naming a direct sibling, so the chain can
/// go null partway through even when its final segment isn't a pointer.
fn is_multi_segment(principal_name: &str) -> bool {
    principal_name.contains("->") || principal_name.contains("[i].")
}

/// The hard-coded `pInfos[i].geometryCount` augmentation (see
/// `model/src/registry.rs`) is a synthetic chain the original never
/// guards, since `pInfos` itself is a required, non-optional parameter.
fn is_guard_exempt(var_name: &str) -> bool {
    matches!(var_name, "ppBuildRangeInfos" | "ppMaxPrimitiveCounts")
}

fn next_iter(depth: usize) -> String {
    ITER_NAMES.get(depth).map(|s| s.to_string()).unwrap_or_else(|| format!("i{depth}"))
}

fn innermost_element_is_scalar(var: &Variable) -> bool {
    matches!(
        var.ty.base().category(),
        Some(Category::Default) | Some(Category::BaseType) | Some(Category::Enum)
    )
}

fn base_func_stem(var: &Variable) -> String {
    var.ty.base().name()
}

/// Looks up the ignorable-field table for a `(struct, member)` pair and
/// returns its gate condition, if any.
fn ignorable_condition(owner: &TypeRef, var: &Variable, config: &VenusConfig) -> Option<String> {
    let owner_name = owner.base().name();
    config
        .ignorables_for(&owner_name)
        .into_iter()
        .find(|ig| ig.var_name == var.name)
        .map(|ig| ig.condition.to_string())
}
