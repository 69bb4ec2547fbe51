//! [`Variable`]: a struct member, command parameter, or command return
//! value, paired with the attribute bag the loader/resolver/gate attach to
//! it. Semantic predicates mirror `VkVariable` in the original generator.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::ty::TypeRef;

/// A length expression attached to a dynamic-array or blob variable: the
/// verbatim expression text, plus the principal sibling field name it
/// references (empty for `null-terminated`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LenExpr {
    pub expr: String,
    pub principal_name: String,
}

impl LenExpr {
    pub fn is_null_terminated(&self) -> bool {
        self.expr == "null-terminated"
    }
}

/// Untyped attribute bag, mirroring `VkVariable.attrs` in the original.
/// Kept as a small explicit set of fields rather than an open string-keyed
/// map (spec.md's Design Notes: "Dynamic attribute bags ... become
/// explicit, enumerated fields"), with `extra` left for attributes that are
/// read back verbatim and never branched on at the Rust level.
#[derive(Debug, Clone, Default)]
pub struct VarAttrs {
    pub values: Vec<String>,
    pub len_exprs: Vec<LenExpr>,
    pub optional: Vec<String>,
    pub no_auto_validity: Option<String>,
    pub stride: Option<String>,
    pub selector: Option<String>,
    pub selection: Vec<String>,
    pub wa_require_static_len: Option<String>,
    /// Set by the planner's `_fixup_registry`/`_set_type_needs` equivalent:
    /// whether this is an input parameter, an output parameter, or both
    /// (the in/out case records the sibling length variable it mirrors).
    pub var_in: bool,
    pub var_out: bool,
    /// Ignorable-table condition, set by the planner (4.F).
    pub condition: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub ty: TypeRef,
    pub name: String,
    pub attrs: Rc<RefCell<VarAttrs>>,
}

impl Variable {
    pub fn new(ty: TypeRef, name: impl Into<String>) -> Self {
        Variable {
            ty,
            name: name.into(),
            attrs: Rc::new(RefCell::new(VarAttrs::default())),
        }
    }

    pub fn can_validate(&self) -> bool {
        self.attrs.borrow().no_auto_validity.as_deref() != Some("true")
    }

    pub fn is_optional(&self) -> bool {
        self.attrs
            .borrow()
            .optional
            .first()
            .is_some_and(|v| v == "true")
    }

    pub fn maybe_null(&self) -> bool {
        self.ty.is_pointer() && self.is_optional()
    }

    pub fn is_blob(&self) -> bool {
        let base = self.ty.base();
        self.ty.indirection_depth() == 1
            && !self.ty.is_static_array()
            && base.name() == "void"
            && !self.attrs.borrow().len_exprs.is_empty()
    }

    pub fn is_dynamic_array(&self) -> bool {
        self.ty.is_pointer() && !self.attrs.borrow().len_exprs.is_empty()
    }

    pub fn has_c_string(&self) -> bool {
        self.is_dynamic_array()
            && self
                .attrs
                .borrow()
                .len_exprs
                .iter()
                .any(LenExpr::is_null_terminated)
    }

    pub fn is_p_next(&self) -> bool {
        self.name == "pNext"
    }

    pub fn to_c(&self) -> String {
        use crate::decl::{Decl, Decor};
        let decl = Decl {
            name: self.name.clone(),
            type_name: self.ty.base().name(),
            decor: self.ty.decor().unwrap_or_else(Decor::default),
        };
        decl.to_c(false)
    }
}

/// Private registry extensions, resolver-computed derived properties, and
/// the like are tracked in insertion-ordered maps throughout this crate so
/// output (and error messages) stay deterministic across runs.
pub type OrderedStrings = BTreeMap<String, String>;
