use crate::doc_comment::DocComment;
use crate::extractor::{HttpMethod, RouteExtractor, RouteInfo, ANONYMOUS_HANDLER};
use crate::scanner::{CommentScanner, BLOCK_END};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Maximum number of extra lines a single registration call may span
const MAX_CONTINUATION_LINES: usize = 12;

static QUOTED_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'([^']+)'|"([^"]+)"|`([^`]+)`"#).expect("quoted token pattern is valid")
});

static BIND_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\w$]+(?:\s*\.\s*[\w$]+)*)\s*\.\s*bind\s*\(\s*[\w$]*\s*\)")
        .expect("bind pattern is valid")
});

static INLINE_HANDLER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"=>|\bfunction\b").expect("inline handler pattern is valid"));

static TRAILING_HANDLER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r",\s*([\w$]+(?:\.[\w$]+)*)\s*\)\s*;?\s*$").expect("trailing handler pattern is valid")
});

/// Structural facts read from one route registration statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLine {
    pub method: HttpMethod,
    /// Path literal, normalized to start with `/`
    pub path: String,
    pub requires_auth: bool,
    pub required_roles: Vec<String>,
    pub handler_name: Option<String>,
}

/// Matches route registrations such as
/// `router.post('/batch', authenticate, authorize('EDITOR'), ctrl.create.bind(ctrl))`.
///
/// A line only counts as a route when it has both a verb method call on the router
/// object and a quoted path as the call's first argument.
#[derive(Debug, Clone)]
pub struct RouteLineExtractor {
    route_regex: Regex,
    route_start_regex: Regex,
    authorize_regex: Regex,
    authenticate_name: String,
}

impl RouteLineExtractor {
    /// Create an extractor for the given router identifier and middleware names
    pub fn new(router_object: &str, authenticate_name: &str, authorize_name: &str) -> Self {
        let router = regex::escape(router_object);
        let call = format!(r"\b{}\s*\.\s*(?i:(get|post|put|patch|delete))\s*\(", router);

        let route_regex = Regex::new(&format!(
            r#"{}\s*(?:'([^']*)'|"([^"]*)"|`([^`]*)`)"#,
            call
        ))
        .expect("escaped route pattern is valid");
        let route_start_regex = Regex::new(&call).expect("escaped route pattern is valid");
        let authorize_regex = Regex::new(&format!(
            r"\b{}\s*\(([^)]*)\)",
            regex::escape(authorize_name)
        ))
        .expect("escaped authorize pattern is valid");

        Self {
            route_regex,
            route_start_regex,
            authorize_regex,
            authenticate_name: authenticate_name.to_string(),
        }
    }

    /// Whether the line opens a registration call, complete or not
    pub fn starts_route(&self, line: &str) -> bool {
        !is_comment_line(line) && self.route_start_regex.is_match(line)
    }

    /// Extracts the route facts from one logical line, or `None` if it is not a route.
    pub fn extract(&self, line: &str) -> Option<RouteLine> {
        if is_comment_line(line) {
            return None;
        }

        let captures = self.route_regex.captures(line)?;
        let method = HttpMethod::from_keyword(&captures[1])?;
        let path = captures
            .get(2)
            .or_else(|| captures.get(3))
            .or_else(|| captures.get(4))
            .map(|m| m.as_str())?;

        let requires_auth = line.contains(&self.authenticate_name);

        let mut required_roles: Vec<String> = Vec::new();
        for call in self.authorize_regex.captures_iter(line) {
            for token in QUOTED_TOKEN_REGEX.captures_iter(&call[1]) {
                let role = token
                    .get(1)
                    .or_else(|| token.get(2))
                    .or_else(|| token.get(3))
                    .map(|m| m.as_str().trim().to_string());
                if let Some(role) = role {
                    if !role.is_empty() && !required_roles.contains(&role) {
                        required_roles.push(role);
                    }
                }
            }
        }

        Some(RouteLine {
            method,
            path: crate::extractor::normalize_path(path),
            requires_auth,
            required_roles,
            handler_name: self.handler_name(line),
        })
    }

    fn handler_name(&self, line: &str) -> Option<String> {
        if let Some(captures) = BIND_REGEX.captures(line) {
            let name: String = captures[1].chars().filter(|c| !c.is_whitespace()).collect();
            return Some(name);
        }

        if INLINE_HANDLER_REGEX.is_match(line) {
            return Some(ANONYMOUS_HANDLER.to_string());
        }

        TRAILING_HANDLER_REGEX
            .captures(line.trim_end())
            .map(|captures| captures[1].to_string())
            .filter(|name| name != &self.authenticate_name)
    }
}

impl Default for RouteLineExtractor {
    fn default() -> Self {
        Self::new("router", "authenticate", "authorize")
    }
}

/// Express-style route extractor
///
/// Walks a file line by line, pairing each documentation block with the route
/// registration that follows it.
#[derive(Debug, Clone, Default)]
pub struct ExpressExtractor {
    line_extractor: RouteLineExtractor,
}

impl ExpressExtractor {
    pub fn new(line_extractor: RouteLineExtractor) -> Self {
        Self { line_extractor }
    }

    /// Joins a registration call spread over several lines into one logical line.
    ///
    /// Returns the logical line and how many physical lines it covers.
    fn logical_line(&self, lines: &[&str], start: usize) -> (String, usize) {
        let first = lines[start];
        if !self.line_extractor.starts_route(first) {
            return (first.to_string(), 1);
        }

        let mut logical = first.trim_end().to_string();
        let mut depth = paren_depth(first);
        let mut consumed = 1;

        while depth > 0 && consumed <= MAX_CONTINUATION_LINES && start + consumed < lines.len() {
            let next = lines[start + consumed];
            logical.push(' ');
            logical.push_str(next.trim());
            depth += paren_depth(next);
            consumed += 1;
        }

        if depth > 0 {
            debug!("Unbalanced route registration at line {}", start + 1);
        }

        (logical, consumed)
    }
}

impl RouteExtractor for ExpressExtractor {
    fn extract_routes(&self, source: &str, source_file: &Path) -> Vec<RouteInfo> {
        let lines: Vec<&str> = source.lines().collect();
        let mut routes = Vec::new();
        let mut pending: Option<DocComment> = None;
        let mut index = 0;

        while index < lines.len() {
            let (block, next) = CommentScanner::read_block(&lines, index);
            if let Some(block) = block {
                pending = Some(DocComment::parse(&block.text));
                index = next;
                continue;
            }

            let line = lines[index];
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                index += 1;
                continue;
            }

            if trimmed.starts_with("/*") {
                // Plain block comment: nothing inside it is a route
                pending = None;
                index = skip_block_comment(&lines, index);
                continue;
            }

            let (logical, consumed) = self.logical_line(&lines, index);
            match self.line_extractor.extract(&logical) {
                Some(route_line) => {
                    let route = build_route(route_line, pending.take(), source_file);
                    debug!(
                        "Found route {} {} at {}:{}",
                        route.method,
                        route.path,
                        source_file.display(),
                        index + 1
                    );
                    routes.push(route);
                    index += consumed;
                }
                None => {
                    // Only a comment directly above a registration documents it
                    pending = None;
                    index += 1;
                }
            }
        }

        routes
    }
}

fn build_route(route_line: RouteLine, doc: Option<DocComment>, source_file: &Path) -> RouteInfo {
    let mut route = RouteInfo::new(route_line.path, route_line.method);
    route.requires_auth = route_line.requires_auth;
    route.required_roles = route_line.required_roles;
    route.handler_name = route_line.handler_name;
    route.source_file = source_file.to_path_buf();

    if let Some(doc) = doc {
        route.summary = doc.summary;
        route.description = doc.description;
        route.query_params = doc.query_params;
        route.path_params = doc.path_params;
        route.request_body_type = doc.request_body_type;
        route.response_type = doc.response_type;
        route.deprecated = doc.deprecated;
    }

    route
}

fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with('*') || trimmed.starts_with("/*")
}

/// Index of the first line after the `/* ... */` block opening at `start`.
/// An unterminated block runs to the end of the file.
fn skip_block_comment(lines: &[&str], start: usize) -> usize {
    let opening = lines[start].trim_start();
    if opening[2..].contains(BLOCK_END) {
        return start + 1;
    }
    lines[start + 1..]
        .iter()
        .position(|line| line.contains(BLOCK_END))
        .map(|offset| start + offset + 2)
        .unwrap_or(lines.len())
}

/// Net count of `(` minus `)` outside string literals
fn paren_depth(line: &str) -> i32 {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in line.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }

    depth
}
