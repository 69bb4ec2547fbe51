//! Components B (loader) and C (resolver): parses the Vulkan registry XML
//! (plus any private extension XMLs layered on top) into a [`Registry`],
//! then resolves cross-references that can only be completed once every
//! XML has been read — `pNext` back-references, enum alias chains, the
//! private/public split, and the `VkCommandTypeEXT` high-water mark.
//!
//! Grounded directly on `VkRegistry`/`VkType`/`VkEnums`/`VkFeature`/
//! `VkExtension` in the original generator's `vkxml.py`.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use roxmltree::{Document, Node};
use tracing::{debug, info};

use crate::decl::Decl;
use crate::error::{Result, VenusError};
use crate::ty::{Category, EnumValues, TypeRef, TypeTable};
use crate::variable::{LenExpr, Variable};

/// Types dropped unconditionally regardless of which extensions are
/// enabled: layering structs the driver fills in from core property
/// structs, not wire data.
pub const TYPE_BLOCK_LIST: &[&str] = &[
    "VkPhysicalDeviceLayeredApiPropertiesListKHR",
    "VkPhysicalDeviceLayeredApiPropertiesKHR",
    "VkPhysicalDeviceLayeredApiKHR",
    "VkPhysicalDeviceLayeredApiVulkanPropertiesKHR",
];

#[derive(Debug, Clone)]
pub struct Feature {
    pub api: String,
    pub name: String,
    pub number: String,
    pub types: Vec<TypeRef>,
}

#[derive(Debug, Clone, Default)]
pub struct Extension {
    pub name: String,
    pub number: i64,
    pub supported: Vec<String>,
    pub platform: Option<String>,
    pub promoted: Option<String>,
    pub requires: Vec<String>,
    pub version: i64,
    pub types: Vec<TypeRef>,
    pub optional_types: IndexMap<String, Vec<TypeRef>>,
}

#[derive(Default)]
pub struct Registry {
    pub platform_guards: IndexMap<String, String>,
    pub tags: Vec<String>,
    pub type_table: TypeTable,
    pub features: Vec<Feature>,
    pub extensions: Vec<Extension>,
    pub vk_xml_extension_count: usize,
    pub vk_xml_version: Option<String>,
    pub max_vk_command_type_value: i64,
}

fn is_vulkansc(node: Node) -> bool {
    node.attribute("api") == Some("vulkansc")
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element() && !is_vulkansc(*n))
}

fn elements_tag<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    elements(node).filter(move |n| n.has_tag_name(tag))
}

fn inner_text(elem: Node) -> String {
    let mut parts = Vec::new();
    for child in elem.children() {
        if child.is_text() {
            if let Some(t) = child.text() {
                parts.push(t.trim().to_string());
            }
        } else if child.is_element() {
            if child.has_tag_name("comment") {
                continue;
            }
            if let Some(t) = child.text() {
                parts.push(t.trim().to_string());
            }
            if let Some(tail) = child.tail_text() {
                parts.push(tail.trim().to_string());
            }
        }
    }
    parts.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}

/// `roxmltree` has no `tail` concept (text between a child's closing tag
/// and its next sibling belongs to the parent's text node stream); we
/// reconstruct it by looking at the text node immediately following the
/// element among its parent's children.
trait TailText {
    fn tail_text(&self) -> Option<&str>;
}

impl TailText for Node<'_, '_> {
    fn tail_text(&self) -> Option<&str> {
        self.next_sibling().and_then(|n| if n.is_text() { n.text() } else { None })
    }
}

fn attr_list(elem: Node, name: &str) -> Option<Vec<String>> {
    elem.attribute(name).map(|v| v.split(',').map(|s| s.to_string()).collect())
}

fn parse_variable(elem: Node, table: &mut TypeTable) -> Result<Variable> {
    let c_decl = inner_text(elem);
    let decl = Decl::from_c(&c_decl)?;

    let ty = table.get_or_create_from_decl(&decl);
    let var = Variable::new(ty, decl.name.clone());

    {
        let mut attrs = var.attrs.borrow_mut();
        if let Some(values) = attr_list(elem, "values") {
            attrs.values = values;
        }
        if let Some(len_raw) = elem
            .attribute("altlen")
            .map(|s| s.split(',').map(|s| s.to_string()).collect::<Vec<_>>())
            .or_else(|| attr_list(elem, "len"))
        {
            let mut lens = len_raw;
            if matches!(decl.name.as_str(), "ppBuildRangeInfos" | "ppMaxPrimitiveCounts") {
                lens.push("pInfos[i].geometryCount".to_string());
            }

            let mut len_exprs = Vec::new();
            for l in &lens {
                if l == "null-terminated" {
                    len_exprs.push(LenExpr { expr: l.clone(), principal_name: String::new() });
                    continue;
                }
                len_exprs.push(LenExpr { expr: l.clone(), principal_name: extract_principal_name(l) });
            }
            attrs.len_exprs = len_exprs;
        }
        if let Some(optional) = attr_list(elem, "optional") {
            attrs.optional = optional;
        }
        if let Some(nav) = elem.attribute("noautovalidity") {
            attrs.no_auto_validity = Some(nav.to_string());
        }
        if let Some(stride) = elem.attribute("stride") {
            attrs.stride = Some(stride.to_string());
        }
        if let Some(selector) = elem.attribute("selector") {
            attrs.selector = Some(selector.to_string());
        }
        if let Some(selection) = attr_list(elem, "selection") {
            attrs.selection = selection;
        }
        if let Some(enum_elem) = elements_tag(elem, "enum").next() {
            if let Some(t) = enum_elem.text() {
                attrs.wa_require_static_len = Some(t.to_string());
            }
        }
    }

    Ok(var)
}

/// Reimplements the original's character-class scan: skip to the first
/// lowercase letter, then extend through identifier characters, `->`, and
/// the `[i].` carve-out.
fn extract_principal_name(expr: &str) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut begin = 0;
    while begin < chars.len() && !chars[begin].is_lowercase() {
        begin += 1;
    }
    let mut end = begin + 1;
    while end < chars.len() {
        if chars[end].is_alphanumeric() || chars[end] == '_' {
            end += 1;
        } else if chars[end..].starts_with(&['-', '>'][..]) {
            end += 2;
        } else if chars[end..].starts_with(&['[', 'i', ']', '.'][..]) {
            end += 4;
        } else {
            break;
        }
    }
    chars[begin..end.min(chars.len())].iter().collect()
}

fn parse_type(elem: Node, table: &mut TypeTable) -> Result<()> {
    if let Some(alias) = elem.attribute("alias") {
        let name = elem
            .attribute("name")
            .ok_or_else(|| VenusError::InvariantViolation { detail: "<type alias> missing name".into() })?;
        let target = table.get_or_create_base(alias);
        table.add_alias(name, &target);
        return Ok(());
    }

    let category_attr = elem.attribute("category");
    let name = elem
        .attribute("name")
        .map(|s| s.to_string())
        .or_else(|| elements_tag(elem, "name").next().and_then(|n| n.text()).map(|s| s.to_string()))
        .ok_or_else(|| VenusError::InvariantViolation { detail: "<type> missing name".into() })?;

    if TYPE_BLOCK_LIST.contains(&name.as_str()) {
        return Ok(());
    }

    let category = match category_attr {
        Some("include") => Category::Include,
        None => Category::Default,
        Some("basetype") => Category::BaseType,
        Some("handle") => Category::Handle,
        Some("enum") => Category::Enum,
        Some("bitmask") => Category::Bitmask,
        Some("struct") => Category::Struct,
        Some("union") => Category::Union,
        Some("funcpointer") => Category::FuncPointer,
        Some("define") => Category::Define,
        Some(other) => {
            return Err(VenusError::InvariantViolation {
                detail: format!("unknown type category {other:?}"),
            })
        }
    };

    let ty = table.init_base(&name, category);

    match category {
        Category::Define => {
            ty.0.borrow_mut().define = Some(inner_text(elem));
        }
        Category::BaseType => {
            if let Some(typedef_elem) = elements_tag(elem, "type").next() {
                if let Some(t) = typedef_elem.text() {
                    let typedef = table.get_or_create_base(t);
                    ty.0.borrow_mut().typedef = Some(typedef);
                }
            }
        }
        Category::Handle => {
            if elements_tag(elem, "type").next().and_then(|n| n.text()) == Some("VK_DEFINE_HANDLE") {
                ty.0.borrow_mut().dispatchable = Some(true);
            }
        }
        Category::Enum => {
            ty.0.borrow_mut().enums = Some(EnumValues::default());
        }
        Category::Bitmask => {
            let requires_name = elem.attribute("requires").or_else(|| elem.attribute("bitvalues"));
            let requires = requires_name.map(|r| table.get_or_create_base(r));
            let to = elements_tag(elem, "type")
                .next()
                .and_then(|n| n.text())
                .unwrap_or("VkFlags");
            let typedef = table.get_or_create_base(to);
            let mut node = ty.0.borrow_mut();
            node.typedef = Some(typedef);
            node.requires = requires;
        }
        Category::Struct | Category::Union => {
            parse_struct_or_union(&ty, elem, table)?;
        }
        Category::FuncPointer => {
            parse_funcpointer(&ty, elem, table)?;
        }
        Category::Include | Category::Default => {}
        Category::Command | Category::Derived => unreachable!(),
    }

    Ok(())
}

fn parse_struct_or_union(ty: &TypeRef, elem: Node, table: &mut TypeTable) -> Result<()> {
    let mut members = Vec::new();
    for member_elem in elements_tag(elem, "member") {
        members.push(parse_variable(member_elem, table)?);
    }

    for var in &members {
        let selector_name = var.attrs.borrow().selector.clone();
        if let Some(selector_name) = selector_name {
            if let Some(s) = members.iter().find(|m| m.name == selector_name) {
                var.ty.0.borrow_mut().sty = Some(s.ty.clone());
            }
        }
    }

    let s_type = members.first().and_then(|first| {
        if first.name == "sType" {
            first.attrs.borrow().values.first().cloned()
        } else {
            None
        }
    });

    let struct_extends = elem
        .attribute("structextends")
        .map(|s| s.split(',').map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let returnedonly = elem.attribute("returnedonly").map(|v| v != "false").unwrap_or(false);

    let mut node = ty.0.borrow_mut();
    node.variables = members;
    node.s_type = s_type;
    node.struct_extends_names = struct_extends;
    node.returnedonly = returnedonly;
    Ok(())
}

fn parse_funcpointer(ty: &TypeRef, elem: Node, table: &mut TypeTable) -> Result<()> {
    let full_text = inner_text(elem);
    let mut lines: Vec<&str> = full_text.lines().collect();
    if lines.is_empty() {
        lines = vec![full_text.as_str()];
    }
    let mut proto_line = lines.remove(0).to_string();
    proto_line = proto_line
        .strip_prefix("typedef ")
        .map(|s| s.to_string())
        .unwrap_or(proto_line);
    proto_line = proto_line.replacen("(VKAPI_PTR * ", "", 1);
    if let Some(idx) = proto_line.rfind('(') {
        proto_line.truncate(idx);
    }

    let decl = Decl::from_c(proto_line.trim())?;
    let ret_ty_full = table.get_or_create_from_decl(&decl);
    let ret_ty = if ret_ty_full.base().name() == "void" { None } else { Some(ret_ty_full) };

    let mut params = Vec::new();
    for line in &lines {
        let line = line.trim().trim_end_matches(',').trim_end_matches(')');
        if line.is_empty() {
            continue;
        }
        let pdecl = Decl::from_c(line)?;
        let pty = table.get_or_create_from_decl(&pdecl);
        params.push(Variable::new(pty, pdecl.name));
    }

    let mut node = ty.0.borrow_mut();
    node.variables = params;
    node.ret = ret_ty.map(|t| Variable::new(t, "ret"));
    Ok(())
}

fn parse_enum_value(enum_elem: Node, ext_number: Option<i64>) -> Result<(String, String)> {
    let key = enum_elem
        .attribute("name")
        .ok_or_else(|| VenusError::InvariantViolation { detail: "<enum> missing name".into() })?
        .to_string();

    let mut val = if let Some(alias) = enum_elem.attribute("alias") {
        alias.to_string()
    } else if let Some(value) = enum_elem.attribute("value") {
        value.to_string()
    } else if let Some(bitpos) = enum_elem.attribute("bitpos") {
        let bit: u32 = bitpos.parse().map_err(|_| VenusError::InvariantViolation {
            detail: format!("bad bitpos {bitpos:?}"),
        })?;
        format!("0x{:08x}", 1u64 << bit)
    } else if let Some(offset) = enum_elem.attribute("offset") {
        let offset: i64 = offset.parse().map_err(|_| VenusError::InvariantViolation {
            detail: format!("bad offset {offset:?}"),
        })?;
        let extnumber: i64 = enum_elem
            .attribute("extnumber")
            .map(|s| s.parse().unwrap_or_default())
            .or(ext_number)
            .ok_or_else(|| VenusError::InvariantViolation { detail: "enum offset with no extnumber".into() })?;
        (1_000_000_000 + (extnumber - 1) * 1000 + offset).to_string()
    } else {
        return Err(VenusError::InvariantViolation { detail: format!("{key} has no value-bearing attribute") });
    };

    if let Some(dir) = enum_elem.attribute("dir") {
        val = format!("{dir}{val}");
    }

    Ok((key, val))
}

fn parse_enums_block(elem: Node, table: &mut TypeTable) -> Result<()> {
    let name = elem
        .attribute("name")
        .ok_or_else(|| VenusError::InvariantViolation { detail: "<enums> missing name".into() })?;
    if TYPE_BLOCK_LIST.contains(&name) {
        return Ok(());
    }

    let bitwidth: i32 = elem.attribute("bitwidth").and_then(|b| b.parse().ok()).unwrap_or(32);

    let mut values = IndexMap::new();
    for enum_elem in elements_tag(elem, "enum") {
        let (key, val) = parse_enum_value(enum_elem, None)?;
        values.insert(key, val);
    }

    let ty = table.get(name).ok_or_else(|| VenusError::MissingType { name: name.to_string() })?;
    let mut node = ty.0.borrow_mut();
    let enums = node.enums.get_or_insert_with(EnumValues::default);
    enums.bit_width = bitwidth;
    enums.values = values;
    Ok(())
}

fn parse_require(
    require_elem: Node,
    table: &mut TypeTable,
    ext_number: Option<i64>,
) -> Result<(Vec<TypeRef>, Vec<String>)> {
    let mut types = Vec::new();
    let mut names = Vec::new();

    for child in elements(require_elem) {
        let name = child.attribute("name").unwrap_or_default();
        if TYPE_BLOCK_LIST.contains(&name) {
            continue;
        }

        match child.tag_name().name() {
            "enum" => {
                let Some(extends) = child.attribute("extends") else { continue };
                let ty = table.get(extends).ok_or_else(|| VenusError::MissingType { name: extends.to_string() })?;
                let (key, val) = parse_enum_value(child, ext_number)?;
                let mut node = ty.0.borrow_mut();
                let enums = node.enums.get_or_insert_with(EnumValues::default);
                if let Some(existing) = enums.values.get(&key) {
                    if existing != &val {
                        return Err(VenusError::InvariantViolation {
                            detail: format!("{key} redefined with a different value"),
                        });
                    }
                } else {
                    enums.values.insert(key, val);
                }
            }
            "type" | "command" => {
                let ty = table.get(name).ok_or_else(|| VenusError::MissingType { name: name.to_string() })?;
                if !types.contains(&ty) {
                    types.push(ty);
                    names.push(name.to_string());
                }
            }
            _ => {}
        }
    }

    Ok((types, names))
}

fn parse_feature(elem: Node, table: &mut TypeTable) -> Result<Feature> {
    let api = elem.attribute("api").unwrap_or_default().to_string();
    let name = elem.attribute("name").unwrap_or_default().to_string();
    let number = elem.attribute("number").unwrap_or_default().to_string();

    let mut types = Vec::new();
    for require_elem in elements_tag(elem, "require") {
        let (require_types, _) = parse_require(require_elem, table, None)?;
        for ty in require_types {
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
    }

    Ok(Feature { api, name, number, types })
}

/// Mirrors `VkExtension.filter_depends`: reduces a `depends` expression
/// down to only the extension names this generator actually understands,
/// dropping bare core-version requirements and any OR-branch that can't
/// be fully satisfied.
fn filter_depends(deps: Option<&str>) -> Option<String> {
    let deps = deps?;
    if !deps.contains('+') && !deps.contains(',') {
        if deps.starts_with("VK_VERSION") {
            return None;
        } else if !deps.starts_with("VK_") {
            return None;
        }
        return Some(deps.to_string());
    }

    let mut or_list = Vec::new();
    for dep in deps.split(',') {
        let dep = dep.trim_matches(|c| c == '(' || c == ')');
        if !dep.contains('+') && dep.starts_with("VK_VERSION") {
            continue;
        }

        let mut and_list = Vec::new();
        for and_dep in dep.split('+') {
            let and_dep = and_dep.trim_matches(|c| c == '(' || c == ')');
            if let Some(filtered) = filter_depends(Some(and_dep)) {
                and_list.push(filtered);
            }
        }

        if and_list.is_empty() {
            return None;
        }
        or_list.push(and_list.join("+"));
    }

    Some(or_list.join(","))
}

fn parse_extension(elem: Node, table: &mut TypeTable) -> Result<Extension> {
    let name = elem.attribute("name").unwrap_or_default().to_string();
    let number: i64 = elem.attribute("number").and_then(|n| n.parse().ok()).unwrap_or(0);
    let supported: Vec<String> = elem
        .attribute("supported")
        .map(|s| s.split(',').map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let mut ext = Extension {
        name: name.clone(),
        number,
        supported,
        platform: elem.attribute("platform").map(|s| s.to_string()),
        promoted: elem.attribute("promotedto").map(|s| s.to_string()),
        requires: elem.attribute("requires").map(|s| s.split(',').map(|s| s.to_string()).collect()).unwrap_or_default(),
        version: 0,
        types: Vec::new(),
        optional_types: IndexMap::new(),
    };

    for require_elem in elements_tag(elem, "require") {
        for enum_elem in elements_tag(require_elem, "enum") {
            if let Some(n) = enum_elem.attribute("name") {
                if n.ends_with("SPEC_VERSION") {
                    if let Some(v) = enum_elem.attribute("value").and_then(|v| v.parse().ok()) {
                        ext.version = v;
                    }
                    break;
                }
            }
        }

        if !ext.supported.iter().any(|s| s == "vulkan") {
            continue;
        }

        let (require_types, require_names) = parse_require(require_elem, table, Some(number))?;
        let require_dep = filter_depends(require_elem.attribute("depends"));

        let types = match &require_dep {
            Some(dep) => ext.optional_types.entry(dep.clone()).or_default(),
            None => &mut ext.types,
        };

        for (ty, alias) in require_types.into_iter().zip(require_names) {
            ty.0.borrow_mut().ext_aliases.insert(name.clone(), alias);
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
    }

    Ok(ext)
}

fn parse_command(elem: Node, table: &mut TypeTable) -> Result<()> {
    if let Some(alias) = elem.attribute("alias") {
        let name = elem
            .attribute("name")
            .ok_or_else(|| VenusError::InvariantViolation { detail: "<command alias> missing name".into() })?;
        let target = table.get_or_create_base(alias);
        table.add_alias(name, &target);
        return Ok(());
    }

    let mut name = None;
    let mut params = Vec::new();
    let mut ret_ty: Option<TypeRef> = None;

    for child in elements(elem) {
        match child.tag_name().name() {
            "proto" => {
                let c_decl = inner_text(child);
                let decl = Decl::from_c(&c_decl)?;
                name = Some(decl.name.clone());
                let ty = table.get_or_create_from_decl(&decl);
                ret_ty = if ty.base().name() == "void" { None } else { Some(ty) };
            }
            "param" => {
                params.push(parse_variable(child, table)?);
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| VenusError::InvariantViolation { detail: "<command> missing <proto>".into() })?;
    let ty = table.init_base(&name, Category::Command);

    let can_device_lost = elem
        .attribute("errorcodes")
        .is_some_and(|codes| codes.split(',').any(|c| c == "VK_ERROR_DEVICE_LOST"));

    let mut node = ty.0.borrow_mut();
    node.variables = params;
    node.ret = ret_ty.map(|t| Variable::new(t, "ret"));
    node.can_device_lost = can_device_lost;
    Ok(())
}

impl Registry {
    pub fn parse(vk_xml: &str, private_xmls: &[&str]) -> Result<Registry> {
        let mut reg = Registry::default();

        reg.parse_one(vk_xml)?;
        reg.vk_xml_extension_count = reg.extensions.len();

        let vk_xml_type_names: BTreeSet<String> = reg.type_table.map.keys().cloned().collect();

        for xml in private_xmls {
            reg.parse_one(xml)?;
        }

        reg.resolve(&vk_xml_type_names)?;
        reg.validate()?;

        info!(
            types = reg.type_table.map.len(),
            features = reg.features.len(),
            extensions = reg.extensions.len(),
            private_xmls = private_xmls.len(),
            "registry resolved"
        );
        Ok(reg)
    }

    fn parse_one(&mut self, xml: &str) -> Result<()> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        if is_vulkansc(root) {
            return Ok(());
        }
        debug!(bytes = xml.len(), "parsing registry document");

        for child in elements(root) {
            match child.tag_name().name() {
                "platforms" => {
                    for plat in elements_tag(child, "platform") {
                        if let (Some(name), Some(protect)) = (plat.attribute("name"), plat.attribute("protect")) {
                            self.platform_guards.insert(name.to_string(), protect.to_string());
                        }
                    }
                }
                "tags" => {
                    for tag in elements_tag(child, "tag") {
                        if let Some(name) = tag.attribute("name") {
                            self.tags.push(name.to_string());
                        }
                    }
                }
                "types" => {
                    for type_elem in elements_tag(child, "type") {
                        parse_type(type_elem, &mut self.type_table)?;
                    }
                }
                "enums" => {
                    if child.attribute("type") != Some("constants") {
                        parse_enums_block(child, &mut self.type_table)?;
                    }
                }
                "commands" => {
                    for command_elem in elements_tag(child, "command") {
                        parse_command(command_elem, &mut self.type_table)?;
                    }
                }
                "feature" => {
                    let feat = parse_feature(child, &mut self.type_table)?;
                    self.features.push(feat);
                }
                "extensions" => {
                    for ext_elem in elements_tag(child, "extension") {
                        let ext = parse_extension(ext_elem, &mut self.type_table)?;
                        self.extensions.push(ext);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    pub fn upper_name(&self, name: &str) -> String {
        let mut name = name.to_string();
        let mut suffix = String::new();
        for tag in &self.tags {
            if name.ends_with(tag.as_str()) {
                name.truncate(name.len() - tag.len());
                suffix = format!("_{tag}");
                break;
            }
        }

        let mut out = String::new();
        for c in name.chars() {
            if c.is_lowercase() || c.is_numeric() {
                out.push(c);
            } else {
                out.push('_');
                out.push(c);
            }
        }
        out.trim_start_matches('_').to_uppercase() + &suffix
    }

    fn resolve(&mut self, vk_xml_type_names: &BTreeSet<String>) -> Result<()> {
        for ty in self.type_table.map.values().cloned().collect::<Vec<_>>() {
            let name = ty.name();
            let is_alias = ty.0.borrow().aliases.iter().any(|a| a == &name);
            if is_alias {
                continue;
            }

            {
                let mut node = ty.0.borrow_mut();
                node.is_private = Some(!vk_xml_type_names.contains(&name));
            }

            let struct_extends = ty.0.borrow().struct_extends_names.clone();
            if !struct_extends.is_empty() {
                for extend_name in &struct_extends {
                    let extended = self
                        .type_table
                        .get(extend_name)
                        .ok_or_else(|| VenusError::MissingType { name: extend_name.clone() })?;
                    let already = extended.0.borrow().p_next.contains(&ty);
                    if !already {
                        extended.0.borrow_mut().p_next.push(ty.clone());
                    }
                }
            }

            let is_enum_with_values =
                ty.0.borrow().category == Some(Category::Enum) && ty.0.borrow().enums.as_ref().is_some_and(|e| !e.values.is_empty());
            if !is_enum_with_values {
                continue;
            }

            let keys: Vec<String> = {
                let node = ty.0.borrow();
                node.enums.as_ref().unwrap().values.keys().cloned().collect()
            };
            for key in keys {
                let mut resolved = {
                    let node = ty.0.borrow();
                    node.enums.as_ref().unwrap().values.get(&key).cloned()
                };
                loop {
                    let next = {
                        let node = ty.0.borrow();
                        let values = &node.enums.as_ref().unwrap().values;
                        match &resolved {
                            Some(v) if values.contains_key(v) => values.get(v).cloned(),
                            _ => None,
                        }
                    };
                    match next {
                        Some(v) => resolved = Some(v),
                        None => break,
                    }
                }
                if let Some(resolved_val) = resolved {
                    let mut node = ty.0.borrow_mut();
                    let values = &mut node.enums.as_mut().unwrap().values;
                    if values.get(&key) != Some(&resolved_val) {
                        values.insert(key.clone(), resolved_val);
                    }
                }
            }
        }

        let header_version = self
            .type_table
            .get("VK_HEADER_VERSION")
            .ok_or_else(|| VenusError::MissingType { name: "VK_HEADER_VERSION".into() })?;
        let header_version_complete = self
            .type_table
            .get("VK_HEADER_VERSION_COMPLETE")
            .ok_or_else(|| VenusError::MissingType { name: "VK_HEADER_VERSION_COMPLETE".into() })?;
        self.vk_xml_version = Some(compute_xml_version(&header_version, &header_version_complete)?);

        let command_type_ty = self
            .type_table
            .get("VkCommandTypeEXT")
            .ok_or_else(|| VenusError::MissingType { name: "VkCommandTypeEXT".into() })?;
        let mut max_val = 0i64;
        if let Some(enums) = &command_type_ty.0.borrow().enums {
            for v in enums.values.values() {
                if let Ok(n) = v.trim_start_matches('+').parse::<i64>() {
                    max_val = max_val.max(n);
                }
            }
        }
        self.max_vk_command_type_value = max_val;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for ty in self.type_table.map.values() {
            ty.validate()?;
        }
        Ok(())
    }
}

fn compute_xml_version(ver_ty: &TypeRef, complete_ver_ty: &TypeRef) -> Result<String> {
    let ver_define = ver_ty.0.borrow().define.clone().ok_or_else(|| VenusError::InvariantViolation {
        detail: "VK_HEADER_VERSION has no #define body".into(),
    })?;
    let ver = ver_define
        .rsplit(' ')
        .next()
        .ok_or_else(|| VenusError::InvariantViolation { detail: "malformed VK_HEADER_VERSION".into() })?
        .to_string();

    let complete_define = complete_ver_ty.0.borrow().define.clone().ok_or_else(|| VenusError::InvariantViolation {
        detail: "VK_HEADER_VERSION_COMPLETE has no #define body".into(),
    })?;
    let open = complete_define.rfind('(').ok_or_else(|| VenusError::InvariantViolation {
        detail: "malformed VK_HEADER_VERSION_COMPLETE".into(),
    })?;
    let inner = complete_define[open + 1..complete_define.len() - 1].replace(ver_ty.name().as_str(), &ver);

    if inner.matches(',').count() == 3 {
        Ok(format!("VK_MAKE_API_VERSION({inner})"))
    } else {
        Ok(format!("VK_MAKE_VERSION({inner})"))
    }
}
