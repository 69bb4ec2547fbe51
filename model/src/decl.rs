//! Component A: the C-declaration parser.
//!
//! Parses fragments like `const int* const blah[4]` into a name, a base
//! type name, and a [`Decor`] describing the pointer/array/bit-field shape.
//! Deliberately narrow: no function types, no multi-dimensional arrays, no
//! anonymous types. Mirrors `VkDecl`/`VkDecl.Decor` from the original
//! generator one-for-one.

use crate::error::{Result, VenusError};

/// Decoration applied to a base type: outermost qualifier, array dimension
/// (kept as text — registries use named enum constants as array bounds),
/// bit-field width, and the ordered inner pointer qualifiers (outermost
/// first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decor {
    pub qual: Option<String>,
    pub dim: Option<String>,
    pub bit_size: Option<String>,
    pub ref_quals: Vec<String>,
}

impl Decor {
    pub fn is_pointer(&self) -> bool {
        !self.ref_quals.is_empty()
    }

    pub fn indirection_depth(&self) -> usize {
        self.ref_quals.len()
    }

    pub fn is_static_array(&self) -> bool {
        self.dim.is_some()
    }

    pub fn is_const_static_array(&self) -> bool {
        self.is_static_array() && self.qual.as_deref().is_some_and(|q| q.contains("const"))
    }

    pub fn is_const_pointer(&self) -> bool {
        self.is_pointer() && self.ref_quals.iter().any(|q| q.contains("const"))
    }
}

/// A parsed C declaration: `<decl>.to_c(false) == the original text`, for
/// the supported subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub name: String,
    pub type_name: String,
    pub decor: Decor,
}

impl Decl {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Decl {
            name: name.into(),
            type_name: type_name.into(),
            decor: Decor::default(),
        }
    }

    /// Render back to C syntax. `type_only` drops the variable name, used
    /// when only the base type string is wanted (e.g. for a return type).
    pub fn to_c(&self, type_only: bool) -> String {
        let mut c_decl = self.type_name.clone();

        let mut quals = self.decor.ref_quals.clone();
        quals.push(self.decor.qual.clone().unwrap_or_default());

        let last = quals.len() - 1;
        for (i, qual) in quals.iter().enumerate() {
            let is_first = i == 0;
            let is_last = i == last;

            if !qual.is_empty() {
                if is_first {
                    c_decl = format!("{qual} {c_decl}");
                } else {
                    c_decl = format!("{c_decl} {qual}");
                }
            }

            if is_last {
                if !type_only {
                    c_decl = format!("{c_decl} {}", self.name);
                }
                if let Some(dim) = &self.decor.dim {
                    if c_decl.ends_with('*') {
                        c_decl.push(' ');
                    }
                    c_decl = format!("{c_decl}[{dim}]");
                }
                if let Some(bits) = &self.decor.bit_size {
                    c_decl = format!("{c_decl}:{bits}");
                }
            } else {
                c_decl.push('*');
            }
        }

        c_decl
    }

    /// Parse a declaration fragment. Very limited, matching the original's
    /// own docstring: scans from the end for the bit-field, then the array
    /// dimension, then the identifier, then splits the remaining prefix on
    /// `*` to recover pointer qualifiers.
    pub fn from_c(c_decl: &str) -> Result<Decl> {
        let mut s = c_decl.to_string();

        let mut bit_size = None;
        if let Some(idx) = s.find(':') {
            bit_size = Some(s[idx + 1..].trim().to_string());
            s.truncate(idx);
        }

        let mut array_size = None;
        if let Some(idx) = s.find('[') {
            let close = s.rfind(']').ok_or_else(|| VenusError::MalformedDecl {
                input: c_decl.to_string(),
            })?;
            array_size = Some(s[idx + 1..close].trim().to_string());
            s.truncate(idx);
        }

        let bytes = s.as_bytes();
        let mut end = bytes.len();
        while end > 0 && !(bytes[end - 1] as char).is_alphanumeric() {
            end -= 1;
        }
        if end == 0 {
            return Err(VenusError::MalformedDecl {
                input: c_decl.to_string(),
            });
        }
        let name_start = s[..end]
            .rfind(' ')
            .ok_or_else(|| VenusError::MalformedDecl {
                input: c_decl.to_string(),
            })?;
        let name = s[name_start + 1..end].to_string();
        s.truncate(name_start);

        let mut quals: Vec<String> = s.split('*').map(|q| q.to_string()).collect();
        if quals.is_empty() {
            return Err(VenusError::MalformedDecl {
                input: c_decl.to_string(),
            });
        }
        let mut qualified_type_name: Vec<&str> = quals[0].split_whitespace().collect();
        let type_name = qualified_type_name
            .pop()
            .ok_or_else(|| VenusError::MalformedDecl {
                input: c_decl.to_string(),
            })?
            .to_string();
        quals[0] = qualified_type_name.join(" ");

        let mut ref_quals: Vec<String> = quals.iter().map(|q| q.trim().to_string()).collect();
        let qual = ref_quals.pop().unwrap_or_default();

        Ok(Decl {
            name,
            type_name,
            decor: Decor {
                qual: if qual.is_empty() { None } else { Some(qual) },
                dim: array_size,
                bit_size,
                ref_quals,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C_DECLS: &[&str] = &[
        "int a",
        "int* a",
        "const int a",
        "const int* a",
        "int* const a",
        "int a[3]",
        "int* a[3]",
        "const int a[3]",
        "const int* a[3]",
        "int* const a[3]",
    ];

    #[test]
    fn round_trips_supported_shapes() {
        for c_decl in C_DECLS {
            let decl = Decl::from_c(c_decl).expect("parse");
            assert_eq!(&decl.to_c(false), c_decl, "round-trip for {c_decl:?}");
        }
    }

    #[test]
    fn splits_pointer_qualifiers_outer_to_inner() {
        let decl = Decl::from_c("const int* const* blah").unwrap();
        assert_eq!(decl.name, "blah");
        assert_eq!(decl.type_name, "int");
        assert_eq!(decl.decor.ref_quals, vec!["const".to_string()]);
        assert_eq!(decl.decor.qual.as_deref(), Some("const"));
    }

    #[test]
    fn type_only_drops_the_name() {
        let decl = Decl::from_c("const void* pNext").unwrap();
        assert_eq!(decl.to_c(true), "const void*");
    }

    #[test]
    fn bit_field_width_round_trips() {
        let decl = Decl::from_c("uint32_t flags:3").unwrap();
        assert_eq!(decl.decor.bit_size.as_deref(), Some("3"));
        assert_eq!(decl.to_c(false), "uint32_t flags:3");
    }

    #[test]
    fn rejects_missing_base_type() {
        assert!(matches!(
            Decl::from_c("*"),
            Err(VenusError::MalformedDecl { .. })
        ));
    }
}
