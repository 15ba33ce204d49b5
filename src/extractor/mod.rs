//! Route extraction module for reading route registrations out of source text.
//!
//! This module defines the route model shared by every extraction strategy and the
//! [`RouteExtractor`] trait the rest of the pipeline depends on. Extraction is
//! heuristic: strategies match lines against patterns instead of building
//! a syntax tree, and a line they cannot understand is skipped rather than reported.
//!
//! # Supported Conventions
//!
//! - **Express-style routers**: See [`express::ExpressExtractor`]
//!
//! # Example
//!
//! ```no_run
//! use openapi_from_routes::extractor::{RouteExtractor, express::ExpressExtractor};
//! use std::path::Path;
//!
//! let source = std::fs::read_to_string("src/routes/tag.routes.ts").unwrap();
//! let extractor = ExpressExtractor::default();
//! let routes = extractor.extract_routes(&source, Path::new("src/routes/tag.routes.ts"));
//! println!("Found {} routes", routes.len());
//! ```

pub mod express;

use std::fmt;
use std::path::{Path, PathBuf};

/// Trait for extracting route information from the text of one source file.
///
/// Implementations must be total: any input yields a (possibly empty) list, in source
/// order, and never an error. Swapping the strategy must not require changes on the
/// synthesis side, which only consumes [`RouteInfo`] values.
pub trait RouteExtractor {
    /// Extracts every route registered in `source`, in the order they appear.
    ///
    /// # Arguments
    ///
    /// * `source` - The complete text of the file
    /// * `source_file` - Path of the file, recorded on each returned route
    fn extract_routes(&self, source: &str, source_file: &Path) -> Vec<RouteInfo>;
}

/// Complete information about a single discovered endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    /// Route-local path, always starting with `/` (may contain `:param` segments)
    pub path: String,
    /// The HTTP method for this route
    pub method: HttpMethod,
    /// First narrative line of the preceding doc comment, empty if none
    pub summary: String,
    /// Full narrative text of the preceding doc comment, empty if none
    pub description: String,
    /// Whether the handler chain contains the authentication step
    pub requires_auth: bool,
    /// Ordered, de-duplicated role names passed to the authorization step
    pub required_roles: Vec<String>,
    /// Query parameters in the order they were declared
    pub query_params: Vec<Parameter>,
    /// Path parameters in the order they were declared
    pub path_params: Vec<Parameter>,
    /// Symbolic request body type name
    pub request_body_type: Option<String>,
    /// Symbolic response type name, a trailing `[]` marks a list response
    pub response_type: Option<String>,
    /// Bound handler expression, or [`ANONYMOUS_HANDLER`] for inline handlers
    pub handler_name: Option<String>,
    /// Whether the doc comment marked the route as deprecated
    pub deprecated: bool,
    /// File the route was read from
    pub source_file: PathBuf,
    /// Mount prefix the router is served under
    pub route_prefix: String,
    /// Tag family of the originating file
    pub tags: Vec<String>,
}

/// Handler name recorded for inline handler functions.
pub const ANONYMOUS_HANDLER: &str = "<anonymous>";

/// Mount prefix used when nothing more specific is known.
pub const DEFAULT_ROUTE_PREFIX: &str = "/api/v1";

/// HTTP methods a route registration can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Parse a router method keyword, ignoring case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "patch" => Some(HttpMethod::Patch),
            "delete" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    /// Upper-case method name, e.g. `GET`
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Lower-case method name as used for path item keys and operation ids
    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    /// Path segment (e.g. `/posts/:id`)
    Path,
    /// Query string (e.g. `?page=1`)
    Query,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
        }
    }
}

/// A parameter declared in a doc comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name with any namespace segment stripped
    pub name: String,
    /// Where the parameter is read from
    pub location: ParameterLocation,
    /// Free-text type token from the comment (e.g. `number`)
    pub type_name: String,
    /// Human description
    pub description: String,
    /// Whether the parameter is required
    pub required: bool,
    /// Default value, query parameters only
    pub default_value: Option<String>,
    /// Allowed values, query parameters only
    pub enum_values: Option<Vec<String>>,
}

impl Parameter {
    /// Create a required path parameter
    pub fn path(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Path,
            type_name: type_name.into(),
            description: String::new(),
            required: true,
            default_value: None,
            enum_values: None,
        }
    }

    /// Create a query parameter
    pub fn query(name: impl Into<String>, type_name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Query,
            type_name: type_name.into(),
            description: String::new(),
            required,
            default_value: None,
            enum_values: None,
        }
    }
}

impl RouteInfo {
    /// Create a new RouteInfo with minimal required fields
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: normalize_path(&path.into()),
            method,
            summary: String::new(),
            description: String::new(),
            requires_auth: false,
            required_roles: Vec::new(),
            query_params: Vec::new(),
            path_params: Vec::new(),
            request_body_type: None,
            response_type: None,
            handler_name: None,
            deprecated: false,
            source_file: PathBuf::new(),
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
            tags: Vec::new(),
        }
    }

    /// Document path: prefix and route path joined, `:param` rendered as `{param}`
    pub fn full_path(&self) -> String {
        let prefix = self.route_prefix.trim_end_matches('/');
        let joined = if self.path == "/" && !prefix.is_empty() {
            prefix.to_string()
        } else {
            format!("{}{}", prefix, self.path)
        };
        to_openapi_path(&joined)
    }

    /// Names of the `:param` segments in the route path, in order
    pub fn template_params(&self) -> Vec<String> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
            .map(|name| name.trim_end_matches('?').to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Whether the path addresses a single resource (contains a path parameter)
    pub fn is_single_resource(&self) -> bool {
        !self.template_params().is_empty()
    }
}

/// Ensure a route path starts with `/`
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Convert `:param` segments to OpenAPI `{param}` templates
pub fn to_openapi_path(path: &str) -> String {
    path.split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name.trim_end_matches('?')),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
