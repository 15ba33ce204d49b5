use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static TYPE_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_$][\w$.]*)((?:\[\])*)").expect("type name pattern is valid")
});

/// Type resolver - maps free-text type tokens from doc comments to schema primitives
///
/// Lookup is case-insensitive. Anything the table does not know resolves to
/// [`PrimitiveType::String`] with a warning; resolution never fails.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    /// Lower-cased type token -> primitive
    table: BTreeMap<String, PrimitiveType>,
}

/// JSON-Schema-compatible primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
    /// A string carrying an RFC 3339 timestamp
    DateTime,
}

impl PrimitiveType {
    /// The `type` keyword value for this primitive
    pub fn schema_type(&self) -> &'static str {
        match self {
            PrimitiveType::String | PrimitiveType::DateTime => "string",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
        }
    }

    /// The `format` keyword value, if any
    pub fn format(&self) -> Option<&'static str> {
        match self {
            PrimitiveType::DateTime => Some("date-time"),
            _ => None,
        }
    }
}

/// A symbolic reference to a named data shape, possibly a list of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// The component name (e.g. `Post`)
    pub name: String,
    /// Whether the reference carried the `[]` list marker
    pub is_array: bool,
}

impl TypeRef {
    /// Split a normalized reference such as `Post[]` into name and list marker
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        match trimmed.strip_suffix("[]") {
            Some(name) => Self {
                name: name.trim_end_matches("[]").to_string(),
                is_array: true,
            },
            None => Self {
                name: trimmed.to_string(),
                is_array: false,
            },
        }
    }
}

impl TypeResolver {
    /// Create a resolver with the built-in type table
    pub fn new() -> Self {
        debug!("Initializing TypeResolver");
        let table = [
            ("string", PrimitiveType::String),
            ("str", PrimitiveType::String),
            ("uuid", PrimitiveType::String),
            ("number", PrimitiveType::Number),
            ("float", PrimitiveType::Number),
            ("double", PrimitiveType::Number),
            ("integer", PrimitiveType::Integer),
            ("int", PrimitiveType::Integer),
            ("boolean", PrimitiveType::Boolean),
            ("bool", PrimitiveType::Boolean),
            ("date", PrimitiveType::DateTime),
            ("datetime", PrimitiveType::DateTime),
        ]
        .into_iter()
        .map(|(token, primitive)| (token.to_string(), primitive))
        .collect();

        Self { table }
    }

    /// Add or replace entries in the type table
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, PrimitiveType>) -> Self {
        for (token, primitive) in overrides {
            self.table.insert(token.to_lowercase(), *primitive);
        }
        self
    }

    /// Resolve a free-text type token, defaulting to `string`
    pub fn resolve(&self, token: &str) -> PrimitiveType {
        let key = token.trim().to_lowercase();
        match self.table.get(&key) {
            Some(primitive) => *primitive,
            None => {
                warn!("Unknown parameter type '{}', using string", token);
                PrimitiveType::String
            }
        }
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a type expression from a doc comment into a symbolic reference.
///
/// Braces are removed, `Promise<T>` is unwrapped and `Array<T>` becomes `T[]`. Returns
/// `None` for empty or `void`-like expressions.
pub fn normalize_type_reference(raw: &str) -> Option<String> {
    let mut text = raw.trim();
    if let Some(inner) = text.strip_prefix('{') {
        text = inner.split('}').next().unwrap_or_default().trim();
    }

    loop {
        if let Some(inner) = strip_generic(text, "Promise") {
            text = inner;
            continue;
        }
        if let Some(inner) = strip_generic(text, "Array") {
            return normalize_type_reference(inner).map(|t| format!("{}[]", t));
        }
        break;
    }

    let captures = TYPE_NAME_REGEX.captures(text)?;
    let name = &captures[1];
    if matches!(name, "void" | "any" | "unknown" | "undefined" | "null") {
        return None;
    }

    Some(format!("{}{}", name, &captures[2]))
}

fn strip_generic<'a>(text: &'a str, wrapper: &str) -> Option<&'a str> {
    text.strip_prefix(wrapper)?
        .trim_start()
        .strip_prefix('<')?
        .trim_end()
        .strip_suffix('>')
        .map(str::trim)
}
