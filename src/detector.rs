use crate::config::{GeneratorConfig, RouteFile};
use crate::doc_comment::DocComment;
use crate::scanner::CommentScanner;
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

/// Resource detector for identifying which API resource a route file serves.
///
/// The `ResourceDetector` derives a file's tag family from its file name
/// (`post.routes.ts` -> `Posts`) and its mount prefix from the configuration or from
/// a file-level `@prefix` doc tag.
pub struct ResourceDetector<'a> {
    resource_tags: &'a BTreeMap<String, String>,
    default_prefix: &'a str,
}

/// Result of resource detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    /// Resource keyword read from the file name
    pub resource: String,
    /// Tags stamped on every route of the file
    pub tags: Vec<String>,
    /// Mount prefix for every route of the file
    pub prefix: String,
}

impl<'a> ResourceDetector<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            resource_tags: &config.resource_tags,
            default_prefix: &config.default_prefix,
        }
    }

    /// Detects the tag family and mount prefix of one route file.
    ///
    /// Precedence for the prefix: the configured entry, then an `@prefix` or
    /// `@basePath` tag in the file, then the default prefix. An explicit tag on the
    /// entry replaces the file name lookup.
    ///
    /// # Example
    ///
    /// ```
    /// use openapi_from_routes::config::{GeneratorConfig, RouteFile};
    /// use openapi_from_routes::detector::ResourceDetector;
    ///
    /// let config = GeneratorConfig::default();
    /// let detector = ResourceDetector::new(&config);
    /// let context = detector.detect(&RouteFile::new("src/routes/post.routes.ts"), "");
    /// assert_eq!(context.tags, vec!["Posts".to_string()]);
    /// assert_eq!(context.prefix, "/api/v1");
    /// ```
    pub fn detect(&self, route_file: &RouteFile, source: &str) -> FileContext {
        let resource = resource_keyword(&route_file.path);

        let tag = match &route_file.tag {
            Some(tag) => tag.clone(),
            None => self.tag_for(&resource),
        };

        let prefix = route_file
            .prefix
            .clone()
            .or_else(|| declared_prefix(source))
            .unwrap_or_else(|| self.default_prefix.to_string());

        debug!(
            "{} -> resource '{}', tag '{}', prefix '{}'",
            route_file.path.display(),
            resource,
            tag,
            prefix
        );

        FileContext {
            resource,
            tags: vec![tag],
            prefix,
        }
    }

    fn tag_for(&self, resource: &str) -> String {
        if let Some(tag) = self.resource_tags.get(resource) {
            return tag.clone();
        }
        if let Some(tag) = singular(resource).and_then(|s| self.resource_tags.get(&s)) {
            return tag.clone();
        }
        capitalize(resource)
    }
}

/// `src/routes/post.routes.ts` -> `post`, `userRoutes.ts` -> `user`
pub fn resource_keyword(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    let stem = stem
        .strip_suffix("Routes")
        .or_else(|| stem.strip_suffix("-routes"))
        .or_else(|| stem.strip_suffix("_routes"))
        .unwrap_or(stem);
    stem.to_lowercase()
}

/// The first `@prefix`/`@basePath` declared in any doc block of the file
fn declared_prefix(source: &str) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    let mut index = 0;
    while index < lines.len() {
        let (block, next) = CommentScanner::read_block(&lines, index);
        match block {
            Some(block) => {
                if let Some(prefix) = DocComment::parse(&block.text).prefix {
                    return Some(prefix);
                }
                index = next;
            }
            None => index += 1,
        }
    }
    None
}

fn singular(word: &str) -> Option<String> {
    if let Some(stem) = word.strip_suffix("ies") {
        return Some(format!("{}y", stem));
    }
    word.strip_suffix('s').map(str::to_string)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
