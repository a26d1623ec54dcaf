//! Case-insensitive registry of the names an expression may mention.
//!
//! The catalog is the allow-list of library types: primitive type names
//! (which double as conversion functions), the date/time types, `Math`,
//! `Convert` and `Regex`. Instance members of values are described in
//! [`members`] and are available whatever the catalog contains.
//!
//! Keys are folded to lower case once, when the catalog is built; every
//! lookup folds its argument the same way. Two names that fold to the same
//! key are a [`CatalogError::Collision`], never a first-match-wins.
//!
//! # Examples
//!
//! ```
//! use quill_expr::catalog::{Catalog, CatalogBuilder};
//!
//! let standard = Catalog::standard();
//! assert_eq!(standard.lookup("MATH").map(|s| s.name), Some("Math"));
//! assert_eq!(standard.lookup("int").map(|s| s.name), Some("Int32"));
//!
//! let narrowed = CatalogBuilder::new()
//!     .with("Int32")
//!     .and_then(|b| b.with("Math"))
//!     .and_then(|b| b.build())
//!     .unwrap();
//! assert!(narrowed.lookup("Regex").is_none());
//! ```

pub mod builtin;
pub mod library;
pub mod members;

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

use thiserror::Error;

pub use builtin::{Builtin, CharClass, ConvertTarget, DatePart, MathFn, SpanPart, TimeUnit};

use crate::{types::Type, value::Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("'{name}' collides with an existing entry '{existing}'")]
    Collision { name: String, existing: String },

    #[error("'{0}' is not a library symbol")]
    UnknownSymbol(String),
}

/// One overload of a library method.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
    pub builtin: Builtin,
}

impl Signature {
    pub fn new(params: Vec<Type>, ret: Type, builtin: Builtin) -> Self {
        Signature {
            params,
            ret,
            builtin,
        }
    }
}

/// A named member of a library type or of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// Static property with a fixed value, folded into the tree at bind time
    Constant {
        name: &'static str,
        ty: Type,
        value: Value,
    },
    /// Instance property, read without parentheses
    Property {
        name: &'static str,
        ty: Type,
        builtin: Builtin,
    },
    /// Method with one or more overloads
    Method {
        name: &'static str,
        overloads: Vec<Signature>,
    },
}

impl Member {
    pub fn name(&self) -> &'static str {
        match self {
            Member::Constant { name, .. }
            | Member::Property { name, .. }
            | Member::Method { name, .. } => name,
        }
    }

    pub fn constant(name: &'static str, value: impl Into<Value>, ty: Type) -> Self {
        Member::Constant {
            name,
            ty,
            value: value.into(),
        }
    }

    pub fn property(name: &'static str, ty: Type, builtin: Builtin) -> Self {
        Member::Property { name, ty, builtin }
    }

    pub fn method(name: &'static str, overloads: Vec<Signature>) -> Self {
        Member::Method { name, overloads }
    }
}

/// Finds a member by name, ignoring case.
pub fn find_member<'m>(members: &'m [Member], name: &str) -> Option<&'m Member> {
    members.iter().find(|m| m.name().eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    /// A type that can also be called as a conversion function, `float(it)`
    Type(Type),
    /// A static utility class such as `Math`; only its members are usable
    Class,
}

/// A catalog entry: a library type or class with its static members.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Display name, used in messages and listings
    pub name: &'static str,
    /// Additional spellings, e.g. `int` for `Int32`
    pub aliases: Vec<&'static str>,
    pub kind: SymbolKind,
    pub members: Vec<Member>,
    pub summary: &'static str,
}

impl Symbol {
    pub fn conversion_target(&self) -> Option<&Type> {
        match &self.kind {
            SymbolKind::Type(ty) => Some(ty),
            SymbolKind::Class => None,
        }
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        find_member(&self.members, name)
    }

    /// Display name followed by every alias.
    pub fn spellings(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// An immutable, case-insensitive symbol table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, Arc<Symbol>>,
    symbols: Vec<Arc<Symbol>>,
}

static STANDARD: LazyLock<Catalog> = LazyLock::new(|| {
    let mut catalog = Catalog::default();
    for symbol in library::STANDARD_SYMBOLS.iter() {
        // The standard library is collision-free; a clash would surface in tests
        for spelling in symbol.spellings() {
            catalog.entries.insert(fold(spelling), Arc::clone(symbol));
        }
        catalog.symbols.push(Arc::clone(symbol));
    }
    catalog
});

impl Catalog {
    /// The process-wide standard catalog.
    pub fn standard() -> &'static Catalog {
        &STANDARD
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.entries.get(&fold(name)).map(Arc::as_ref)
    }

    /// Symbols in registration order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().map(Arc::as_ref)
    }

    /// Resolves a type name such as `int`, `long?`, `DateTime[]` or
    /// `double?[]`. Utility classes are not types.
    pub fn resolve_type(&self, name: &str) -> Option<Type> {
        let name = name.trim();
        if let Some(element) = name.strip_suffix("[]") {
            return self.resolve_type(element).map(Type::array_of);
        }
        if let Some(inner) = name.strip_suffix('?') {
            let inner = self.resolve_type(inner)?;
            return inner.is_value_type().then(|| Type::nullable_of(inner));
        }
        self.lookup(name)?.conversion_target().cloned()
    }
}

/// Composes a custom catalog out of standard library symbols.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    entries: Vec<(String, &'static str, Arc<Symbol>)>,
}

impl CatalogBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        CatalogBuilder::default()
    }

    /// A builder pre-populated with every standard symbol.
    pub fn standard() -> Self {
        let mut builder = CatalogBuilder::new();
        for symbol in library::STANDARD_SYMBOLS.iter() {
            builder.push_symbol(symbol);
        }
        builder
    }

    fn push_symbol(&mut self, symbol: &Arc<Symbol>) {
        for spelling in symbol.spellings() {
            self.entries
                .push((fold(spelling), spelling, Arc::clone(symbol)));
        }
    }

    fn standard_symbol(name: &str) -> Result<&'static Arc<Symbol>, CatalogError> {
        let folded = fold(name);
        library::STANDARD_SYMBOLS
            .iter()
            .find(|symbol| symbol.spellings().any(|s| fold(s) == folded))
            .ok_or_else(|| CatalogError::UnknownSymbol(name.to_string()))
    }

    /// Adds a standard symbol (with all its spellings).
    pub fn with(mut self, name: &str) -> Result<Self, CatalogError> {
        let symbol = Self::standard_symbol(name)?;
        if !self.entries.iter().any(|(_, _, s)| Arc::ptr_eq(s, symbol)) {
            self.push_symbol(symbol);
        }
        Ok(self)
    }

    /// Removes a symbol and all its spellings.
    pub fn without(mut self, name: &str) -> Result<Self, CatalogError> {
        let folded = fold(name);
        let symbol = self
            .entries
            .iter()
            .find(|(key, _, _)| *key == folded)
            .map(|(_, _, symbol)| Arc::clone(symbol))
            .ok_or_else(|| CatalogError::UnknownSymbol(name.to_string()))?;
        self.entries.retain(|(_, _, s)| !Arc::ptr_eq(s, &symbol));
        Ok(self)
    }

    /// Adds another spelling for a symbol already in the builder.
    pub fn alias(mut self, alias: &'static str, target: &str) -> Result<Self, CatalogError> {
        let folded = fold(target);
        let symbol = self
            .entries
            .iter()
            .find(|(key, _, _)| *key == folded)
            .map(|(_, _, symbol)| Arc::clone(symbol))
            .ok_or_else(|| CatalogError::UnknownSymbol(target.to_string()))?;
        self.entries.push((fold(alias), alias, symbol));
        Ok(self)
    }

    /// Builds the catalog, rejecting spellings that fold to the same key
    /// but name different symbols.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::default();
        let mut spellings: HashMap<String, &'static str> = HashMap::new();

        for (key, spelling, symbol) in self.entries {
            if let Some(existing) = catalog.entries.get(&key) {
                if Arc::ptr_eq(existing, &symbol) {
                    continue;
                }
                return Err(CatalogError::Collision {
                    name: spelling.to_string(),
                    existing: spellings
                        .get(&key)
                        .map_or_else(|| existing.name.to_string(), |s| s.to_string()),
                });
            }
            if !catalog.symbols.iter().any(|s| Arc::ptr_eq(s, &symbol)) {
                catalog.symbols.push(Arc::clone(&symbol));
            }
            spellings.insert(key.clone(), spelling);
            catalog.entries.insert(key, symbol);
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let catalog = Catalog::standard();
        for name in ["Single", "single", "SINGLE", "float"] {
            assert_eq!(catalog.lookup(name).map(|s| s.name), Some("Single"));
        }
    }

    #[test]
    fn test_standard_catalog_has_no_collisions() {
        assert!(CatalogBuilder::standard().build().is_ok());
    }

    #[test]
    fn test_alias_collision_is_rejected() {
        let result = CatalogBuilder::new()
            .with("Int32")
            .and_then(|b| b.with("Int64"))
            .and_then(|b| b.alias("INT", "long"))
            .and_then(|b| b.build());
        assert!(matches!(result, Err(CatalogError::Collision { .. })));
    }

    #[test]
    fn test_resolve_type_suffixes() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.resolve_type("int"), Some(Type::Int32));
        assert_eq!(
            catalog.resolve_type("long?"),
            Some(Type::nullable_of(Type::Int64))
        );
        assert_eq!(
            catalog.resolve_type("double?[]"),
            Some(Type::array_of(Type::nullable_of(Type::Double)))
        );
        assert_eq!(catalog.resolve_type("string?"), None);
        assert_eq!(catalog.resolve_type("Math"), None);
    }
}
