//! [`Type`]: the tagged-variant node of the registry type graph (spec
//! section 3). One node per category — Include, Define, Default, BaseType,
//! Handle, Enum, Bitmask, Struct, Union, FuncPointer, Command, Derived —
//! collapsing the deep class hierarchy the original generator builds with
//! a single Python class and a `category` tag (spec.md's Design Notes).
//!
//! The graph is cyclic (`VkBaseOutStructure.pNext` refers to itself) and
//! built incrementally: a type may be referenced, and so created as an
//! empty placeholder, before its defining `<type>` element is parsed. We
//! model this with `Rc<RefCell<TypeNode>>` so every reference to a name
//! shares the same mutable node, exactly as the Python `type_table` shares
//! the same object across every key that names it (base key, derived keys,
//! alias keys).

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::decl::Decor;
use crate::variable::Variable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Include,
    Define,
    Default,
    BaseType,
    Handle,
    Enum,
    Bitmask,
    Struct,
    Union,
    FuncPointer,
    Command,
    Derived,
}

/// Ordered enum-value table. Bit width is 32 unless the `<enums
/// bitwidth="64">` attribute says otherwise.
#[derive(Debug, Clone, Default)]
pub struct EnumValues {
    pub bit_width: i32,
    pub values: IndexMap<String, String>,
    /// Snapshot of the value names that came from the first (canonical)
    /// XML, taken right after it's parsed and before any private XML
    /// extends it further. Used to detect enums extended by a private
    /// registry, mirroring `vk_xml_values` in the original.
    pub canonical_values: Option<std::collections::BTreeSet<String>>,
}

/// The mutable node shared by every key (base, derived, alias) that names
/// the same declared type.
pub struct TypeNode {
    pub name: String,
    pub category: Option<Category>,
    /// `self` for every non-`Derived` type; the pointed-to base type for
    /// `Derived`. Always `Some` once `init` has run.
    pub base: Option<TypeRef>,

    pub aliases: Vec<String>,
    pub ext_aliases: BTreeMap<String, String>,

    pub is_private: Option<bool>,

    pub define: Option<String>,
    pub typedef: Option<TypeRef>,
    pub dispatchable: Option<bool>,
    pub enums: Option<EnumValues>,
    pub requires: Option<TypeRef>,

    pub s_type: Option<String>,
    pub struct_extends_names: Vec<String>,
    pub p_next: Vec<TypeRef>,
    pub returnedonly: bool,

    pub ret: Option<Variable>,
    pub can_device_lost: bool,
    pub has_out_ty: bool,

    pub variables: Vec<Variable>,

    pub decor: Option<Decor>,
    pub sty: Option<TypeRef>,

    // Type-level planner attributes (spec.md Design Notes enumerated set).
    pub need_array: bool,
    pub need_encode: bool,
    pub need_decode: bool,
    pub need_partial: bool,
    pub need_blob_encode: bool,
    pub c_type: Option<String>,
    pub c_objtype: Option<String>,
}

impl fmt::Debug for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeNode")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl TypeNode {
    fn placeholder(name: impl Into<String>) -> Self {
        TypeNode {
            name: name.into(),
            category: None,
            base: None,
            aliases: Vec::new(),
            ext_aliases: BTreeMap::new(),
            is_private: None,
            define: None,
            typedef: None,
            dispatchable: None,
            enums: None,
            requires: None,
            s_type: None,
            struct_extends_names: Vec::new(),
            p_next: Vec::new(),
            returnedonly: false,
            ret: None,
            can_device_lost: false,
            has_out_ty: false,
            variables: Vec::new(),
            decor: None,
            sty: None,
            need_array: false,
            need_encode: false,
            need_decode: false,
            need_partial: false,
            need_blob_encode: false,
            c_type: None,
            c_objtype: None,
        }
    }
}

/// Shared handle to a [`TypeNode`]. Equality and hashing are by node
/// identity, matching Python object identity semantics in the `type_table`.
#[derive(Clone)]
pub struct TypeRef(pub Rc<RefCell<TypeNode>>);

impl TypeRef {
    fn new_placeholder(name: impl Into<String>) -> Self {
        TypeRef(Rc::new(RefCell::new(TypeNode::placeholder(name))))
    }

    pub fn borrow(&self) -> Ref<'_, TypeNode> {
        self.0.borrow()
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn category(&self) -> Option<Category> {
        self.0.borrow().category
    }

    /// The base type: itself for non-derived types, the pointed-to type
    /// for `Derived`. Panics if called before `init`, matching the
    /// invariant that every reachable node is initialized by the time the
    /// resolver runs.
    pub fn base(&self) -> TypeRef {
        self.0
            .borrow()
            .base
            .clone()
            .expect("type referenced before init")
    }

    pub fn decor(&self) -> Option<Decor> {
        self.0.borrow().decor.clone()
    }

    pub fn is_static_array(&self) -> bool {
        self.0
            .borrow()
            .decor
            .as_ref()
            .is_some_and(Decor::is_static_array)
    }

    pub fn static_array_size(&self) -> Option<String> {
        self.0.borrow().decor.as_ref().and_then(|d| d.dim.clone())
    }

    pub fn is_pointer(&self) -> bool {
        self.0
            .borrow()
            .decor
            .as_ref()
            .is_some_and(Decor::is_pointer)
    }

    pub fn indirection_depth(&self) -> usize {
        self.0
            .borrow()
            .decor
            .as_ref()
            .map(Decor::indirection_depth)
            .unwrap_or(0)
    }

    pub fn is_const_static_array(&self) -> bool {
        self.0
            .borrow()
            .decor
            .as_ref()
            .is_some_and(Decor::is_const_static_array)
    }

    pub fn is_const_pointer(&self) -> bool {
        self.0
            .borrow()
            .decor
            .as_ref()
            .is_some_and(Decor::is_const_pointer)
    }

    /// True for `char*`/`const char*`, not for `char[N]` or arrays thereof.
    pub fn is_c_string(&self) -> bool {
        self.base().name() == "char" && self.indirection_depth() == 1
    }

    pub fn is_valid_union(&self) -> bool {
        let node = self.0.borrow();
        if node.category != Some(Category::Union) {
            return false;
        }
        node.variables.iter().all(|v| !v.attrs.borrow().selection.is_empty())
    }

    /// `(selection-tag, member)` pairs for a tagged union, or
    /// `(index, member)` pairs in declaration order otherwise.
    pub fn union_cases(&self) -> Vec<(String, Variable)> {
        let node = self.0.borrow();
        if !self.is_valid_union() {
            return node
                .variables
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect();
        }
        let mut cases = Vec::new();
        for var in &node.variables {
            for s in &var.attrs.borrow().selection {
                cases.push((s.clone(), var.clone()));
            }
        }
        cases
    }

    /// Resolve a length-expression principal name (`a->b`, or the
    /// `a[i].b` nested-array carve-out) to the chain of sibling
    /// `Variable`s it names. Empty if any segment can't be found.
    pub fn find_variables(&self, len_name: &str) -> Vec<Variable> {
        let names: Vec<&str> = if len_name.contains("[i].") {
            len_name.split("[i].").collect()
        } else {
            len_name.split("->").collect()
        };

        let mut var_list: Vec<Variable> = Vec::new();
        for name in names {
            let candidates = if let Some(last) = var_list.last() {
                last.ty.base().borrow().variables.clone()
            } else {
                self.base().borrow().variables.clone()
            };

            match candidates.into_iter().find(|v| v.name == name) {
                Some(found) => var_list.push(found),
                None => return Vec::new(),
            }
        }

        var_list
    }

    /// Recursive dependency closure through member types, typedef targets,
    /// bitmask requirements, and return types. Never through `p_next` —
    /// that's a separate, optional relation the gate (4.D) filters down
    /// after the fact, not a hard dependency.
    pub fn dependencies(&self) -> Vec<TypeRef> {
        let mut deps = Vec::new();
        self.add_deps(&mut deps);
        deps
    }

    fn add_deps(&self, deps: &mut Vec<TypeRef>) {
        let ty = self.base();
        if deps.iter().any(|d| Rc::ptr_eq(&d.0, &ty.0)) {
            return;
        }

        let (typedef, requires, ret, variables) = {
            let node = ty.0.borrow();
            (
                node.typedef.clone(),
                node.requires.clone(),
                node.ret.clone(),
                node.variables.clone(),
            )
        };

        if let Some(typedef) = typedef {
            typedef.add_deps(deps);
        }
        if let Some(requires) = requires {
            requires.add_deps(deps);
        }
        if let Some(ret) = ret {
            ret.ty.add_deps(deps);
        }
        for var in &variables {
            if !Rc::ptr_eq(&var.ty.base().0, &ty.0) {
                var.ty.add_deps(deps);
            }
        }

        if !deps.iter().any(|d| Rc::ptr_eq(&d.0, &ty.0)) {
            deps.push(ty);
        }
    }

    /// Propagate a type-level boolean attribute through the member and
    /// `p_next` graph. Short-circuits at `VkBaseOutStructure`, which
    /// refers to itself through its own `pNext` field and would otherwise
    /// recurse forever (spec section 5).
    pub fn set_need(&self, which: Need, value: bool) {
        let ty = self.base();
        if ty.name() == "VkBaseOutStructure" {
            return;
        }

        {
            let mut node = ty.0.borrow_mut();
            match which {
                Need::Array => node.need_array = value,
                Need::Encode => node.need_encode = value,
                Need::Decode => node.need_decode = value,
                Need::Partial => node.need_partial = value,
                Need::BlobEncode => node.need_blob_encode = value,
            }
        }

        let (variables, p_next) = {
            let node = ty.0.borrow();
            (node.variables.clone(), node.p_next.clone())
        };
        for var in &variables {
            var.ty.set_need(which, value);
        }
        for next_ty in &p_next {
            next_ty.set_need(which, value);
        }
    }

    pub fn c_func_params(&self, separator: &str) -> String {
        self.0
            .borrow()
            .variables
            .iter()
            .map(Variable::to_c)
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn validate(&self) -> Result<(), crate::error::VenusError> {
        let node = self.0.borrow();
        let base = node
            .base
            .as_ref()
            .ok_or_else(|| crate::error::VenusError::InvariantViolation {
                detail: format!("{} was never initialized", node.name),
            })?;

        if Rc::ptr_eq(&base.0, &self.0) {
            // non-derived: base == self
            if node.category != Some(Category::Include) && !is_identifier(&node.name) {
                return Err(crate::error::VenusError::InvariantViolation {
                    detail: format!("{} is not a valid identifier", node.name),
                });
            }
            if node.category == Some(Category::Derived) {
                return Err(crate::error::VenusError::InvariantViolation {
                    detail: format!("{} is Derived but base == self", node.name),
                });
            }
            if node.decor.is_some() {
                return Err(crate::error::VenusError::InvariantViolation {
                    detail: format!("{} is non-derived but carries a decorator", node.name),
                });
            }
        } else if node.category != Some(Category::Derived) {
            return Err(crate::error::VenusError::InvariantViolation {
                detail: format!("{} has a distinct base but isn't Derived", node.name),
            });
        } else if node.decor.is_none() {
            return Err(crate::error::VenusError::InvariantViolation {
                detail: format!("{} is Derived but has no decorator", node.name),
            });
        }

        if node.s_type.is_some() {
            let ok = node
                .variables
                .first()
                .is_some_and(|v| v.name == "sType")
                && node.variables.get(1).is_some_and(|v| v.name == "pNext");
            if !ok {
                return Err(crate::error::VenusError::InvariantViolation {
                    detail: format!(
                        "{} declares sType but its first two members aren't sType, pNext",
                        node.name
                    ),
                });
            }
        }

        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Need {
    Array,
    Encode,
    Decode,
    Partial,
    BlobEncode,
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name())
    }
}

/// Owns the global name→type table; the sole place new [`TypeRef`]s are
/// minted, so that every reference to a given declared type shares one
/// node (spec.md's Registry invariant: "one entry per concrete C
/// declaration ... aliases live as additional keys").
#[derive(Default)]
pub struct TypeTable {
    pub map: IndexMap<String, TypeRef>,
}

impl TypeTable {
    pub fn new() -> Self {
        TypeTable::default()
    }

    pub fn get(&self, name: &str) -> Option<TypeRef> {
        self.map.get(name).cloned()
    }

    /// Get-or-create a base (non-derived) type by name.
    pub fn get_or_create_base(&mut self, name: &str) -> TypeRef {
        if let Some(ty) = self.map.get(name) {
            return ty.clone();
        }
        let ty = TypeRef::new_placeholder(name);
        self.map.insert(name.to_string(), ty.clone());
        ty
    }

    /// Get-or-create a type from a parsed [`crate::decl::Decl`], creating a
    /// `Derived` wrapper over the base type if the declaration carries a
    /// pointer/array decoration.
    pub fn get_or_create_from_decl(&mut self, decl: &crate::decl::Decl) -> TypeRef {
        let full_name = decl.to_c(true);
        if let Some(ty) = self.map.get(&full_name) {
            return ty.clone();
        }

        let base_ty = self.get_or_create_base(&decl.type_name);
        if full_name == decl.type_name {
            return base_ty;
        }

        let derived = TypeRef::new_placeholder(full_name.clone());
        {
            let mut node = derived.0.borrow_mut();
            node.category = Some(Category::Derived);
            node.base = Some(base_ty);
            node.decor = Some(decl.decor.clone());
        }
        self.map.insert(full_name, derived.clone());
        derived
    }

    /// Initialize a (possibly pre-existing placeholder) base type's
    /// category, and alias it to itself.
    pub fn init_base(&mut self, name: &str, category: Category) -> TypeRef {
        let ty = self.get_or_create_base(name);
        {
            let mut node = ty.0.borrow_mut();
            if let Some(existing) = node.category {
                if existing != category {
                    tracing::warn!(name, ?existing, ?category, "type category redefined, likely a private-XML collision");
                }
            }
            node.category = Some(category);
            if category != Category::Derived {
                node.base = Some(ty_self_ref(&ty));
            }
        }
        ty
    }

    pub fn add_alias(&mut self, alias: &str, target: &TypeRef) {
        target.0.borrow_mut().aliases.push(alias.to_string());
        self.map.insert(alias.to_string(), target.clone());
    }
}

fn ty_self_ref(ty: &TypeRef) -> TypeRef {
    ty.clone()
}
