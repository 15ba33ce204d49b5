//! Structured reading of documentation comments.
//!
//! A route's doc comment carries everything that cannot be read from the registration
//! line itself: the narrative summary and description, declared query and path
//! parameters, and the symbolic request and response type names.
//!
//! ```text
//! /**
//!  * 获取文章列表
//!  * 支持分页与关键字搜索
//!  * @param {number} query.page 页码 (可选, 默认: 1)
//!  * @param {string} query.sort 排序方式 [latest, popular]
//!  * @returns {Post[]}
//!  */
//! ```

use crate::extractor::{Parameter, ParameterLocation};
use crate::scanner::{BLOCK_END, BLOCK_START};
use crate::type_resolver::normalize_type_reference;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@(\w+)\s*(.*)$").expect("tag pattern is valid"));

static PARAM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{\s*([^}]*?)\s*\}\s+(\[[^\]]*\]|[^\s\[\]]+)\s*(.*)$")
        .expect("param pattern is valid")
});

static DEFAULT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:默认值|默认|default)\s*[:：=]?\s*([^\s,，;；)）\]]+)")
        .expect("default pattern is valid")
});

static ENUM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\[\]]*,[^\[\]]*)\]").expect("enum pattern is valid")
});

/// Parsed contents of one documentation comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocComment {
    /// First narrative line
    pub summary: String,
    /// First contiguous run of narrative lines, joined with `\n`
    pub description: String,
    pub query_params: Vec<Parameter>,
    pub path_params: Vec<Parameter>,
    pub request_body_type: Option<String>,
    pub response_type: Option<String>,
    pub deprecated: bool,
    /// File-level mount prefix declared with `@prefix` or `@basePath`
    pub prefix: Option<String>,
}

impl DocComment {
    /// Parses the raw text of a comment block.
    ///
    /// Malformed tag lines are logged and skipped; the rest of the comment is still
    /// read. Parsing never fails.
    pub fn parse(raw: &str) -> Self {
        let mut doc = DocComment::default();
        let mut narrative: Vec<String> = Vec::new();
        let mut narrative_closed = false;

        for line in raw.lines().map(strip_comment_decoration) {
            if line.is_empty() {
                if !narrative.is_empty() {
                    narrative_closed = true;
                }
                continue;
            }

            if let Some(captures) = TAG_REGEX.captures(&line) {
                narrative_closed = true;
                let tag = captures[1].to_ascii_lowercase();
                let value = captures[2].trim();
                doc.apply_tag(&tag, value);
                continue;
            }

            if !narrative_closed {
                narrative.push(line);
            }
        }

        if let Some(first) = narrative.first() {
            doc.summary = first.clone();
        }
        doc.description = narrative.join("\n");
        doc
    }

    /// Whether the comment carried no usable information at all
    pub fn is_empty(&self) -> bool {
        self == &DocComment::default()
    }

    fn apply_tag(&mut self, tag: &str, value: &str) {
        match tag {
            "param" => self.apply_param(value),
            "requestbody" | "body" => match normalize_type_reference(value) {
                Some(type_name) => self.request_body_type = Some(type_name),
                None => warn!("Ignoring @{} without a type: '{}'", tag, value),
            },
            "returns" | "return" | "response" => {
                self.response_type = normalize_type_reference(value);
            }
            "deprecated" => self.deprecated = true,
            "prefix" | "basepath" => match value.split_whitespace().next() {
                Some(prefix) => self.prefix = Some(prefix.to_string()),
                None => warn!("Ignoring @{} without a path", tag),
            },
            _ => debug!("Skipping unrecognised doc tag @{}", tag),
        }
    }

    fn apply_param(&mut self, value: &str) {
        let Some(captures) = PARAM_REGEX.captures(value) else {
            warn!("Skipping malformed @param line: '{}'", value);
            return;
        };

        let type_name = captures[1].trim().to_string();
        if type_name.is_empty() {
            warn!("Skipping @param without a type: '{}'", value);
            return;
        }

        let raw_name = &captures[2];
        let free_text = captures[3].trim().trim_start_matches('-').trim().to_string();

        // JSDoc optional forms: [name] and [name=default]
        let (qualified_name, bracket_default, bracket_optional) =
            match raw_name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
                Some(inner) => match inner.split_once('=') {
                    Some((name, default)) => {
                        (name.trim(), Some(default.trim().to_string()), true)
                    }
                    None => (inner.trim(), None, true),
                },
                None => (raw_name, None, false),
            };

        let name = strip_namespace(qualified_name);
        if name.is_empty() {
            warn!("Skipping @param without a name: '{}'", value);
            return;
        }

        match classify(qualified_name, &free_text) {
            Some(ParameterLocation::Path) => {
                let mut param = Parameter::path(name, type_name);
                param.description = free_text;
                self.path_params.push(param);
            }
            Some(ParameterLocation::Query) => {
                let required = !bracket_optional && !mentions_optional(&free_text);
                let mut param = Parameter::query(name, type_name, required);
                param.default_value = bracket_default.or_else(|| extract_default(&free_text));
                param.enum_values = extract_enum(&free_text);
                param.description = free_text;
                self.query_params.push(param);
            }
            None => debug!("@param {} is neither a query nor a path parameter", qualified_name),
        }
    }
}

/// Removes block delimiters and leading asterisks from one comment line
fn strip_comment_decoration(line: &str) -> String {
    let mut text = line.trim();
    if let Some(rest) = text.strip_prefix(BLOCK_START) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(BLOCK_END) {
        text = rest;
    }
    text.trim().trim_start_matches('*').trim().to_string()
}

/// `req.query.page` becomes `page`
fn strip_namespace(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name).trim()
}

fn classify(qualified_name: &str, free_text: &str) -> Option<ParameterLocation> {
    let lower_name = qualified_name.to_lowercase();
    let namespace = lower_name
        .rsplit_once('.')
        .map(|(ns, _)| ns)
        .unwrap_or_default();
    let lower_text = free_text.to_lowercase();

    if namespace.contains("params")
        || namespace.contains("path")
        || free_text.contains("路径")
        || lower_text.contains("path")
    {
        return Some(ParameterLocation::Path);
    }

    if lower_name.contains("query") || free_text.contains("参数") {
        return Some(ParameterLocation::Query);
    }

    None
}

fn mentions_optional(free_text: &str) -> bool {
    free_text.to_lowercase().contains("optional") || free_text.replace("可选值", "").contains("可选")
}

/// The last default-value marker in the text wins
fn extract_default(free_text: &str) -> Option<String> {
    DEFAULT_REGEX
        .captures_iter(free_text)
        .last()
        .map(|captures| captures[1].trim_matches(|c| c == '\'' || c == '"').to_string())
}

fn extract_enum(free_text: &str) -> Option<Vec<String>> {
    let captures = ENUM_REGEX.captures(free_text)?;
    let values: Vec<String> = captures[1]
        .split(',')
        .map(|v| v.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|v| !v.is_empty())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_and_description() {
        let doc = DocComment::parse(
            "/**\n * 获取文章列表\n * 支持分页与关键字搜索\n *\n * 这一行不属于描述\n * @returns {Post[]}\n */",
        );

        assert_eq!(doc.summary, "获取文章列表");
        assert_eq!(doc.description, "获取文章列表\n支持分页与关键字搜索");
        assert_eq!(doc.response_type, Some("Post[]".to_string()));
    }

    #[test]
    fn test_single_line_comment() {
        let doc = DocComment::parse("/** 获取所有标签 */");
        assert_eq!(doc.summary, "获取所有标签");
        assert_eq!(doc.description, "获取所有标签");
    }

    #[test]
    fn test_query_param_defaults_to_required() {
        let doc = DocComment::parse("/**\n * @param {string} query.keyword 搜索关键字\n */");

        assert_eq!(doc.query_params.len(), 1);
        let param = &doc.query_params[0];
        assert_eq!(param.name, "keyword");
        assert_eq!(param.type_name, "string");
        assert!(param.required);
        assert_eq!(param.description, "搜索关键字");
    }

    #[test]
    fn test_query_param_optional_default_and_enum() {
        let doc = DocComment::parse(
            "/**\n * @param {number} query.page 页码 (可选, 默认: 1)\n * @param {string} req.query.sort 排序 [latest, popular] optional default=latest\n */",
        );

        let page = &doc.query_params[0];
        assert_eq!(page.name, "page");
        assert!(!page.required);
        assert_eq!(page.default_value, Some("1".to_string()));
        assert_eq!(page.enum_values, None);

        let sort = &doc.query_params[1];
        assert_eq!(sort.name, "sort");
        assert!(!sort.required);
        assert_eq!(sort.default_value, Some("latest".to_string()));
        assert_eq!(
            sort.enum_values,
            Some(vec!["latest".to_string(), "popular".to_string()])
        );
    }

    #[test]
    fn test_enum_hint_alone_keeps_param_required() {
        let doc = DocComment::parse("/** @param {string} query.status 状态, 可选值 [draft, published] */");
        let status = &doc.query_params[0];
        assert!(status.required);
        assert_eq!(status.enum_values.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_localized_parameter_marker_classifies_as_query() {
        let doc = DocComment::parse("/** @param {number} limit 每页数量参数 */");
        assert_eq!(doc.query_params.len(), 1);
        assert_eq!(doc.query_params[0].name, "limit");
    }

    #[test]
    fn test_jsdoc_bracket_optional_form() {
        let doc = DocComment::parse("/** @param {number} [query.limit=10] 每页数量 */");
        let limit = &doc.query_params[0];
        assert_eq!(limit.name, "limit");
        assert!(!limit.required);
        assert_eq!(limit.default_value, Some("10".to_string()));
    }

    #[test]
    fn test_path_params() {
        let doc = DocComment::parse(
            "/**\n * 获取文章详情\n * @param {number} params.id 文章ID\n * @param {string} slug 路径参数 别名\n */",
        );

        assert!(doc.query_params.is_empty());
        assert_eq!(doc.path_params.len(), 2);
        assert_eq!(doc.path_params[0].name, "id");
        assert_eq!(doc.path_params[0].location, ParameterLocation::Path);
        assert!(doc.path_params[0].required);
        assert_eq!(doc.path_params[1].name, "slug");
    }

    #[test]
    fn test_unclassified_params_are_ignored() {
        let doc = DocComment::parse("/**\n * @param {Request} req\n * @param {Response} res\n */");
        assert!(doc.query_params.is_empty());
        assert!(doc.path_params.is_empty());
    }

    #[test]
    fn test_malformed_param_line_is_skipped() {
        let doc = DocComment::parse(
            "/**\n * 创建文章\n * @param query.page 缺少类型\n * @param {} query.limit 空类型\n * @param {string}\n * @param {number} query.size 每页数量\n * @requestBody {CreatePostDto}\n */",
        );

        assert_eq!(doc.summary, "创建文章");
        assert_eq!(doc.query_params.len(), 1);
        assert_eq!(doc.query_params[0].name, "size");
        assert_eq!(doc.request_body_type, Some("CreatePostDto".to_string()));
    }

    #[test]
    fn test_body_response_deprecated_and_prefix() {
        let doc = DocComment::parse(
            "/**\n * @basePath /api/v1/tags\n * @body UpdateTagDto\n * @response {Promise<Tag>}\n * @deprecated\n */",
        );

        assert_eq!(doc.prefix, Some("/api/v1/tags".to_string()));
        assert_eq!(doc.request_body_type, Some("UpdateTagDto".to_string()));
        assert_eq!(doc.response_type, Some("Tag".to_string()));
        assert!(doc.deprecated);
        assert_eq!(doc.summary, "");
    }

    #[test]
    fn test_empty_comment() {
        let doc = DocComment::parse("/**\n *\n */");
        assert!(doc.is_empty());
    }
}
