use crate::config::GeneratorConfig;
use crate::extractor::{self, HttpMethod, ParameterLocation, RouteInfo};
use crate::schema_generator::{Schema, SchemaGenerator, API_ERROR, MESSAGE_RESPONSE};
use crate::type_resolver::{TypeRef, TypeResolver};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;

/// OpenAPI version written into every document
pub const OPENAPI_VERSION: &str = "3.0.3";

const JSON_CONTENT: &str = "application/json";

/// OpenAPI document builder
///
/// Routes are added one at a time with [`OpenApiBuilder::add_route`]; structural
/// problems found along the way are recorded, never fatal.
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    servers: Vec<Server>,
    security_scheme_name: String,
    security_scheme: SecurityScheme,
    tag_descriptions: BTreeMap<String, String>,
    examples: BTreeMap<String, Value>,
    include_examples: bool,
    shared_parameters: BTreeMap<String, ParameterObject>,
    error_descriptions: BTreeMap<String, String>,
    /// Prefix left out of operation ids
    default_prefix: String,
    /// Tags in first-seen order
    tag_order: Vec<String>,
    /// Operation ids per tag, in route order
    tag_groups: BTreeMap<String, Vec<String>>,
    /// Paths collection (URL path -> PathItem)
    paths: BTreeMap<String, PathItem>,
    /// Which file registered each (path, method) pair
    registrations: BTreeMap<(String, HttpMethod), PathBuf>,
    operation_ids: BTreeSet<String>,
    issues: Vec<StructuralIssue>,
    route_count: usize,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

/// OpenAPI Contact object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// OpenAPI Server object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Tag object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
}

impl PathItem {
    /// The operation slot for a method
    pub fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Delete => &mut self.delete,
        }
    }

    /// The operation registered for a method, if any
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
        }
    }

    /// All present operations in method order
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        [&self.get, &self.post, &self.put, &self.patch, &self.delete]
            .into_iter()
            .filter_map(Option::as_ref)
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Status code -> response
    pub responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// Handler expression the route is bound to
    #[serde(rename = "x-handler", skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

/// Security scheme name -> scopes
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// An inline parameter or a `$ref` to a shared one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(ParameterObject),
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterObject {
    pub name: String,
    /// Parameter location (path, query)
    #[serde(rename = "in")]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub schema: Schema,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI SecurityScheme object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(rename = "securitySchemes", default)]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterObject>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub components: Components,
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
}

impl OpenApiDocument {
    /// Names of the declared top-level tags
    pub fn tag_names(&self) -> BTreeSet<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    /// Number of operations across all paths
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations().count()).sum()
    }
}

/// A consistency problem found while synthesizing. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralIssue {
    /// Two routes resolved to the same path and method; the later one was kept
    DuplicateRoute {
        path: String,
        method: HttpMethod,
        first_file: PathBuf,
        second_file: PathBuf,
    },
    /// An operation id was already taken and a numeric suffix was appended
    DuplicateOperationId { requested: String, assigned: String },
    /// A parameter with the same name and location was declared twice
    DuplicateParameter {
        operation_id: String,
        name: String,
        location: ParameterLocation,
    },
}

impl fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralIssue::DuplicateRoute {
                path,
                method,
                first_file,
                second_file,
            } => write!(
                f,
                "duplicate route {} {} ({} and {}), last one kept",
                method,
                path,
                first_file.display(),
                second_file.display()
            ),
            StructuralIssue::DuplicateOperationId {
                requested,
                assigned,
            } => write!(f, "operation id '{}' already used, renamed to '{}'", requested, assigned),
            StructuralIssue::DuplicateParameter {
                operation_id,
                name,
                location,
            } => write!(
                f,
                "operation '{}' declares {} parameter '{}' more than once",
                operation_id,
                location.as_str(),
                name
            ),
        }
    }
}

/// Outcome of a synthesis run besides the document itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisReport {
    pub route_count: usize,
    pub operation_count: usize,
    /// Operation ids per tag, tags in first-seen order
    pub tag_groups: Vec<(String, Vec<String>)>,
    pub issues: Vec<StructuralIssue>,
}

impl OpenApiBuilder {
    /// Create a builder from the static tables of a configuration
    pub fn new(config: &GeneratorConfig) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: config.info.clone(),
            servers: config.servers.clone(),
            security_scheme_name: config.security_scheme_name.clone(),
            security_scheme: config.security_scheme.clone(),
            tag_descriptions: config.tag_descriptions.clone(),
            examples: config.examples.clone(),
            include_examples: config.include_examples,
            shared_parameters: config.shared_parameters.clone(),
            error_descriptions: config.error_responses.clone(),
            default_prefix: config.default_prefix.clone(),
            tag_order: Vec::new(),
            tag_groups: BTreeMap::new(),
            paths: BTreeMap::new(),
            registrations: BTreeMap::new(),
            operation_ids: BTreeSet::new(),
            issues: Vec::new(),
            route_count: 0,
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    /// Add a route to the OpenAPI document
    pub fn add_route(&mut self, route: &RouteInfo, schema_gen: &mut SchemaGenerator) {
        let path = route.full_path();
        debug!("Adding route: {} {}", route.method, path);
        self.route_count += 1;

        let operation_id = self.unique_operation_id(route);
        let parameters = self.build_parameters(route, &operation_id, schema_gen);
        let request_body = self.build_request_body(route, schema_gen);
        let responses = self.build_responses(route, schema_gen);

        let security = if route.requires_auth {
            let mut requirement = SecurityRequirement::new();
            requirement.insert(self.security_scheme_name.clone(), Vec::new());
            Some(vec![requirement])
        } else {
            None
        };

        let mut description = route.description.clone();
        if !route.required_roles.is_empty() {
            if !description.is_empty() {
                description.push_str("\n\n");
            }
            description.push_str(&format!("所需角色: {}", route.required_roles.join(", ")));
        }

        let summary = if route.summary.is_empty() {
            format!("{} {}", route.method, path)
        } else {
            route.summary.clone()
        };

        for tag in &route.tags {
            if !self.tag_order.contains(tag) {
                self.tag_order.push(tag.clone());
            }
            self.tag_groups
                .entry(tag.clone())
                .or_default()
                .push(operation_id.clone());
        }

        let operation = Operation {
            tags: route.tags.clone(),
            summary,
            description: if description.is_empty() {
                None
            } else {
                Some(description)
            },
            operation_id,
            parameters,
            request_body,
            responses,
            security,
            deprecated: route.deprecated.then_some(true),
            handler: route.handler_name.clone(),
        };

        let key = (path.clone(), route.method);
        if let Some(first_file) = self.registrations.get(&key) {
            let issue = StructuralIssue::DuplicateRoute {
                path: path.clone(),
                method: route.method,
                first_file: first_file.clone(),
                second_file: route.source_file.clone(),
            };
            warn!("{}", issue);
            self.issues.push(issue);
        }
        self.registrations.insert(key, route.source_file.clone());

        let path_item = self.paths.entry(path).or_default();
        *path_item.slot_mut(route.method) = Some(operation);
    }

    /// Operation id from the verb and the camel-cased path, made unique with a
    /// numeric suffix
    fn unique_operation_id(&mut self, route: &RouteInfo) -> String {
        let requested = operation_id_for(route, &self.default_prefix);
        let mut assigned = requested.clone();
        let mut counter = 2;
        while self.operation_ids.contains(&assigned) {
            assigned = format!("{}{}", requested, counter);
            counter += 1;
        }

        if assigned != requested {
            let issue = StructuralIssue::DuplicateOperationId {
                requested,
                assigned: assigned.clone(),
            };
            warn!("{}", issue);
            self.issues.push(issue);
        }

        self.operation_ids.insert(assigned.clone());
        assigned
    }

    fn build_parameters(
        &mut self,
        route: &RouteInfo,
        operation_id: &str,
        schema_gen: &SchemaGenerator,
    ) -> Vec<ParameterOrRef> {
        let template = route.template_params();
        let mut candidates: Vec<extractor::Parameter> = Vec::new();

        for param in &route.path_params {
            if template.contains(&param.name) {
                candidates.push(param.clone());
            } else {
                warn!(
                    "Path parameter '{}' is not part of {} {}, skipping",
                    param.name, route.method, route.path
                );
            }
        }
        for name in &template {
            if !route.path_params.iter().any(|p| &p.name == name) {
                debug!("Declaring undocumented path parameter '{}'", name);
                candidates.push(extractor::Parameter::path(name.clone(), "string"));
            }
        }
        candidates.extend(route.query_params.iter().cloned());

        let mut seen: HashSet<(String, ParameterLocation)> = HashSet::new();
        let mut parameters = Vec::new();

        for param in candidates {
            if !seen.insert((param.name.clone(), param.location)) {
                let issue = StructuralIssue::DuplicateParameter {
                    operation_id: operation_id.to_string(),
                    name: param.name.clone(),
                    location: param.location,
                };
                warn!("{}", issue);
                self.issues.push(issue);
                continue;
            }

            let schema = schema_gen.parameter_schema(&param);
            if let Some(component) = self.shared_parameter_for(&param, &schema) {
                parameters.push(ParameterOrRef::Reference {
                    reference: format!("#/components/parameters/{}", component),
                });
                continue;
            }

            parameters.push(ParameterOrRef::Inline(ParameterObject {
                name: param.name.clone(),
                location: param.location.as_str().to_string(),
                description: if param.description.is_empty() {
                    None
                } else {
                    Some(param.description.clone())
                },
                required: param.location == ParameterLocation::Path || param.required,
                schema,
            }));
        }

        parameters
    }

    /// Shared component a query parameter can be replaced by. The declaration
    /// must add nothing of its own and agree with the template on
    /// `required` and type, otherwise it stays inline.
    fn shared_parameter_for(
        &self,
        param: &extractor::Parameter,
        schema: &Schema,
    ) -> Option<&str> {
        if param.location != ParameterLocation::Query
            || param.default_value.is_some()
            || param.enum_values.is_some()
        {
            return None;
        }
        self.shared_parameters
            .iter()
            .find(|(_, shared)| {
                shared.name == param.name
                    && shared.location == "query"
                    && shared.required == param.required
                    && shared.schema.schema_type == schema.schema_type
            })
            .map(|(component, _)| component.as_str())
    }

    fn build_request_body(
        &self,
        route: &RouteInfo,
        schema_gen: &mut SchemaGenerator,
    ) -> Option<RequestBody> {
        let body_type = TypeRef::parse(route.request_body_type.as_deref()?);
        let reference = schema_gen.reference(&body_type.name);
        let schema = if body_type.is_array {
            Schema::array(reference)
        } else {
            reference
        };

        let example = if self.include_examples {
            let example = self.examples.get(&body_type.name).cloned();
            if example.is_none() {
                warn!("No request example for '{}'", body_type.name);
            }
            example
        } else {
            None
        };

        let mut content = BTreeMap::new();
        content.insert(JSON_CONTENT.to_string(), MediaType { schema, example });

        Some(RequestBody {
            description: Some(format!("{} 请求体", body_type.name)),
            required: true,
            content,
        })
    }

    fn build_responses(
        &self,
        route: &RouteInfo,
        schema_gen: &mut SchemaGenerator,
    ) -> BTreeMap<String, Response> {
        let (status, description) = match route.method {
            HttpMethod::Get => ("200", "获取成功"),
            HttpMethod::Post => ("201", "创建成功"),
            HttpMethod::Put | HttpMethod::Patch => ("200", "更新成功"),
            HttpMethod::Delete => ("200", "删除成功"),
        };

        let schema = if route.method == HttpMethod::Delete && route.response_type.is_none() {
            schema_gen.reference(MESSAGE_RESPONSE)
        } else {
            schema_gen.response_schema(route.response_type.as_deref())
        };

        let mut responses = BTreeMap::new();
        responses.insert(status.to_string(), json_response(description, schema));

        let mut error_statuses = Vec::new();
        if matches!(
            route.method,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch
        ) {
            error_statuses.push("400");
        }
        if route.requires_auth {
            error_statuses.push("401");
        }
        if !route.required_roles.is_empty() {
            error_statuses.push("403");
        }
        if route.is_single_resource() {
            error_statuses.push("404");
        }
        error_statuses.push("500");

        for status in error_statuses {
            let description = self
                .error_descriptions
                .get(status)
                .cloned()
                .unwrap_or_else(|| format!("HTTP {}", status));
            let error_schema = schema_gen.reference(API_ERROR);
            responses.insert(status.to_string(), json_response(&description, error_schema));
        }

        responses
    }

    /// Build the final OpenAPI document and the synthesis report
    pub fn build(self, schema_gen: SchemaGenerator) -> (OpenApiDocument, SynthesisReport) {
        debug!("Building final OpenAPI document");

        let tags: Vec<Tag> = self
            .tag_order
            .iter()
            .map(|name| {
                let description = match self.tag_descriptions.get(name) {
                    Some(description) => description.clone(),
                    None => {
                        warn!("No description for tag '{}', using default", name);
                        format!("{} 相关操作", name)
                    }
                };
                Tag {
                    name: name.clone(),
                    description: Some(description),
                }
            })
            .collect();

        let mut security_schemes = BTreeMap::new();
        security_schemes.insert(self.security_scheme_name.clone(), self.security_scheme.clone());

        let document = OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            servers: self.servers,
            tags,
            paths: self.paths,
            components: Components {
                security_schemes,
                schemas: schema_gen.into_schemas(),
                parameters: self.shared_parameters,
            },
            security: Vec::new(),
        };

        let mut tag_groups = self.tag_groups;
        let report = SynthesisReport {
            route_count: self.route_count,
            operation_count: document.operation_count(),
            tag_groups: self
                .tag_order
                .iter()
                .map(|tag| (tag.clone(), tag_groups.remove(tag).unwrap_or_default()))
                .collect(),
            issues: self.issues,
        };

        (document, report)
    }
}

/// Synthesize a document from a route corpus in one call
pub fn synthesize(routes: &[RouteInfo], config: &GeneratorConfig) -> (OpenApiDocument, SynthesisReport) {
    let type_resolver = TypeResolver::new().with_overrides(&config.type_overrides);
    let mut schema_gen = SchemaGenerator::new(type_resolver, config.schemas.clone());
    let mut builder = OpenApiBuilder::new(config);

    for route in routes {
        builder.add_route(route, &mut schema_gen);
    }

    builder.build(schema_gen)
}

fn json_response(description: &str, schema: Schema) -> Response {
    let mut content = BTreeMap::new();
    content.insert(
        JSON_CONTENT.to_string(),
        MediaType {
            schema,
            example: None,
        },
    );
    Response {
        description: description.to_string(),
        content: Some(content),
    }
}

/// `GET /api/v1/posts/:id/comments` becomes `getPostsByIdComments`
fn operation_id_for(route: &RouteInfo, default_prefix: &str) -> String {
    let prefix = route.route_prefix.trim_end_matches('/');
    let full = format!("{}{}", prefix, route.path);
    let default_prefix = default_prefix.trim_end_matches('/');
    let local = match full.strip_prefix(default_prefix) {
        Some(rest) if !default_prefix.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
            rest
        }
        _ => full.as_str(),
    };

    let mut id = route.method.as_lower().to_string();
    let mut has_segments = false;
    for segment in local.split('/').filter(|s| !s.is_empty()) {
        has_segments = true;
        match segment.strip_prefix(':') {
            Some(param) => {
                id.push_str("By");
                id.push_str(&pascal_case(param.trim_end_matches('?')));
            }
            None => id.push_str(&pascal_case(segment)),
        }
    }
    if !has_segments {
        id.push_str("Root");
    }
    id
}

fn pascal_case(segment: &str) -> String {
    segment
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Parameter;
    use pretty_assertions::assert_eq;

    fn route(method: HttpMethod, path: &str, prefix: &str, tag: &str) -> RouteInfo {
        let mut route = RouteInfo::new(path, method);
        route.route_prefix = prefix.to_string();
        route.tags = vec![tag.to_string()];
        route.source_file = PathBuf::from(format!("src/routes/{}.routes.ts", tag.to_lowercase()));
        route
    }

    fn build(routes: &[RouteInfo]) -> (OpenApiDocument, SynthesisReport) {
        synthesize(routes, &GeneratorConfig::default())
    }

    #[test]
    fn test_operation_id_camel_cases_path() {
        let r = route(HttpMethod::Get, "/:id/comments", "/api/v1/posts", "Posts");
        assert_eq!(operation_id_for(&r, "/api/v1"), "getPostsByIdComments");

        let r = route(HttpMethod::Put, "/me/change-password", "/api/v1/users", "Users");
        assert_eq!(operation_id_for(&r, "/api/v1"), "putUsersMeChangePassword");

        let r = route(HttpMethod::Get, "/", "/api/v1", "Health");
        assert_eq!(operation_id_for(&r, "/api/v1"), "getRoot");
    }

    #[test]
    fn test_operation_id_prefix_strip_respects_segments() {
        let r = route(HttpMethod::Get, "/", "/api/v1x/items", "Items");
        assert_eq!(operation_id_for(&r, "/api/v1"), "getApiV1xItems");

        let r = route(HttpMethod::Get, "/", "/api/v1/items", "Items");
        assert_eq!(operation_id_for(&r, "/api/v1"), "getItems");
    }

    #[test]
    fn test_simple_get_operation() {
        let mut r = route(HttpMethod::Get, "/all", "/api/v1/tags", "Tags");
        r.summary = "获取所有标签".to_string();
        r.description = "获取所有标签".to_string();
        r.response_type = Some("Tag[]".to_string());

        let (doc, report) = build(&[r]);

        assert_eq!(doc.openapi, OPENAPI_VERSION);
        let op = doc.paths["/api/v1/tags/all"].get.as_ref().unwrap();
        assert_eq!(op.operation_id, "getTagsAll");
        assert_eq!(op.summary, "获取所有标签");
        assert_eq!(op.tags, vec!["Tags"]);
        assert!(op.security.is_none());
        assert!(op.request_body.is_none());
        assert_eq!(
            op.responses.keys().cloned().collect::<Vec<_>>(),
            vec!["200", "500"]
        );
        assert!(report.issues.is_empty());
        assert_eq!(report.tag_groups, vec![("Tags".to_string(), vec!["getTagsAll".to_string()])]);
    }

    #[test]
    fn test_protected_post_with_roles() {
        let mut r = route(HttpMethod::Post, "/batch", "/api/v1/tags", "Tags");
        r.requires_auth = true;
        r.required_roles = vec!["EDITOR".to_string(), "ADMIN".to_string()];
        r.description = "批量创建标签".to_string();
        r.request_body_type = Some("CreateTagDto".to_string());
        r.handler_name = Some("ctrl.create".to_string());

        let (doc, _) = build(&[r]);
        let op = doc.paths["/api/v1/tags/batch"].post.as_ref().unwrap();

        assert_eq!(
            op.responses.keys().cloned().collect::<Vec<_>>(),
            vec!["201", "400", "401", "403", "500"]
        );
        let security = op.security.as_ref().unwrap();
        assert!(security[0].contains_key("bearerAuth"));
        assert_eq!(
            op.description.as_deref(),
            Some("批量创建标签\n\n所需角色: EDITOR, ADMIN")
        );
        assert_eq!(op.handler.as_deref(), Some("ctrl.create"));

        let body = op.request_body.as_ref().unwrap();
        let media = &body.content["application/json"];
        assert_eq!(media.schema.referenced_name(), Some("CreateTagDto"));
        assert!(media.example.is_some());
        assert!(doc.components.schemas.contains_key("CreateTagDto"));
    }

    #[test]
    fn test_examples_can_be_disabled() {
        let mut r = route(HttpMethod::Post, "/", "/api/v1/tags", "Tags");
        r.request_body_type = Some("CreateTagDto".to_string());
        let config = GeneratorConfig {
            include_examples: false,
            ..GeneratorConfig::default()
        };

        let (doc, _) = synthesize(&[r], &config);
        let body = doc.paths["/api/v1/tags"].post.as_ref().unwrap().request_body.as_ref().unwrap();
        assert!(body.content["application/json"].example.is_none());
    }

    #[test]
    fn test_delete_single_resource_uses_message_schema() {
        let mut r = route(HttpMethod::Delete, "/:id", "/api/v1/posts", "Posts");
        r.requires_auth = true;

        let (doc, _) = build(&[r]);
        let op = doc.paths["/api/v1/posts/{id}"].delete.as_ref().unwrap();

        assert_eq!(
            op.responses.keys().cloned().collect::<Vec<_>>(),
            vec!["200", "401", "404", "500"]
        );
        let schema = &op.responses["200"].content.as_ref().unwrap()["application/json"].schema;
        assert_eq!(schema.referenced_name(), Some(MESSAGE_RESPONSE));

        // the undocumented :id segment is still declared
        assert_eq!(op.parameters.len(), 1);
        match &op.parameters[0] {
            ParameterOrRef::Inline(p) => {
                assert_eq!(p.name, "id");
                assert_eq!(p.location, "path");
                assert!(p.required);
            }
            other => panic!("unexpected parameter {:?}", other),
        }
    }

    #[test]
    fn test_query_parameters_and_shared_templates() {
        let mut r = route(HttpMethod::Get, "/", "/api/v1/posts", "Posts");
        r.query_params = vec![
            Parameter::query("page", "integer", false),
            {
                let mut p = Parameter::query("sort", "string", false);
                p.enum_values = Some(vec!["latest".to_string(), "popular".to_string()]);
                p.default_value = Some("latest".to_string());
                p
            },
            Parameter::query("page", "integer", true),
        ];

        let (doc, report) = build(&[r]);
        let op = doc.paths["/api/v1/posts"].get.as_ref().unwrap();

        assert_eq!(op.parameters.len(), 2);
        assert_eq!(
            op.parameters[0],
            ParameterOrRef::Reference {
                reference: "#/components/parameters/PageParam".to_string()
            }
        );
        match &op.parameters[1] {
            ParameterOrRef::Inline(p) => {
                assert_eq!(p.name, "sort");
                assert!(!p.required);
                assert_eq!(p.schema.default, Some(Value::from("latest")));
                assert_eq!(p.schema.enum_values.as_ref().map(Vec::len), Some(2));
            }
            other => panic!("unexpected parameter {:?}", other),
        }
        assert!(doc.components.parameters.contains_key("PageParam"));
        assert!(matches!(
            report.issues.as_slice(),
            [StructuralIssue::DuplicateParameter { name, .. }] if name == "page"
        ));
    }

    #[test]
    fn test_shared_template_requires_matching_declaration() {
        let mut r = route(HttpMethod::Get, "/search", "/api/v1/posts", "Posts");
        r.query_params = vec![
            Parameter::query("keyword", "string", true),
            Parameter::query("page", "number", false),
            Parameter::query("limit", "integer", false),
        ];

        let (doc, _) = build(&[r]);
        let op = doc.paths["/api/v1/posts/search"].get.as_ref().unwrap();

        assert_eq!(op.parameters.len(), 3);
        match &op.parameters[0] {
            ParameterOrRef::Inline(p) => {
                assert_eq!(p.name, "keyword");
                assert!(p.required);
            }
            other => panic!("unexpected parameter {:?}", other),
        }
        match &op.parameters[1] {
            ParameterOrRef::Inline(p) => {
                assert_eq!(p.name, "page");
                assert_eq!(p.schema.schema_type.as_deref(), Some("number"));
            }
            other => panic!("unexpected parameter {:?}", other),
        }
        assert_eq!(
            op.parameters[2],
            ParameterOrRef::Reference {
                reference: "#/components/parameters/LimitParam".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_route_is_reported_and_last_wins() {
        let mut first = route(HttpMethod::Get, "/:id", "/api/v1", "Posts");
        first.summary = "文章详情".to_string();
        let mut second = route(HttpMethod::Get, "/:id", "/api/v1", "Users");
        second.summary = "用户详情".to_string();

        let (doc, report) = build(&[first, second]);

        assert_eq!(doc.paths.len(), 1);
        let op = doc.paths["/api/v1/{id}"].get.as_ref().unwrap();
        assert_eq!(op.summary, "用户详情");
        assert_eq!(op.operation_id, "getById2");
        assert_eq!(report.route_count, 2);
        assert_eq!(report.operation_count, 1);
        assert!(report.issues.iter().any(|i| matches!(i, StructuralIssue::DuplicateRoute { .. })));
        assert!(report.issues.iter().any(|i| matches!(
            i,
            StructuralIssue::DuplicateOperationId { assigned, .. } if assigned == "getById2"
        )));
    }

    #[test]
    fn test_every_operation_tag_is_declared() {
        let routes = vec![
            route(HttpMethod::Get, "/", "/api/v1/posts", "Posts"),
            route(HttpMethod::Get, "/", "/api/v1/notes", "Notes"),
            route(HttpMethod::Get, "/", "/api/v1/users", "Users"),
        ];

        let (doc, _) = build(&routes);
        let declared = doc.tag_names();
        for item in doc.paths.values() {
            for op in item.operations() {
                for tag in &op.tags {
                    assert!(declared.contains(tag), "dangling tag {}", tag);
                }
            }
        }

        let names: Vec<&str> = doc.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Posts", "Notes", "Users"]);
        assert_eq!(doc.tags[1].description.as_deref(), Some("Notes 相关操作"));
    }

    #[test]
    fn test_summary_falls_back_to_method_and_path() {
        let r = route(HttpMethod::Patch, "/:id/status", "/api/v1/posts", "Posts");
        let (doc, _) = build(&[r]);
        let op = doc.paths["/api/v1/posts/{id}/status"].patch.as_ref().unwrap();
        assert_eq!(op.summary, "PATCH /api/v1/posts/{id}/status");
        assert!(op.description.is_none());
    }

    #[test]
    fn test_deprecated_flag() {
        let mut r = route(HttpMethod::Get, "/legacy", "/api/v1/posts", "Posts");
        r.deprecated = true;
        let (doc, _) = build(&[r]);
        assert_eq!(doc.paths["/api/v1/posts/legacy"].get.as_ref().unwrap().deprecated, Some(true));
    }

    #[test]
    fn test_empty_corpus() {
        let (doc, report) = build(&[]);
        assert!(doc.paths.is_empty());
        assert!(doc.tags.is_empty());
        assert!(doc.components.security_schemes.contains_key("bearerAuth"));
        assert_eq!(report.route_count, 0);
    }
}
