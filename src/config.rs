//! Generator configuration.
//!
//! Every table the generator consults (route files, tag names and descriptions,
//! known schemas, request examples, shared parameters) lives in [`GeneratorConfig`].
//! The default value documents the blog API; a YAML or JSON file passed with
//! `--config` replaces any subset of it.

use crate::error::{Error, Result};
use crate::openapi_builder::{Contact, Info, ParameterObject, SecurityScheme, Server};
use crate::schema_generator::Schema;
use crate::type_resolver::PrimitiveType;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the generated document
pub const DEFAULT_OUTPUT: &str = "docs/openapi.yaml";

/// Everything the generator needs besides the route sources themselves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub info: Info,
    pub servers: Vec<Server>,
    /// Mount prefix for files that declare none
    pub default_prefix: String,
    /// Identifier routes are registered on (`router.get(...)`)
    pub router_object: String,
    /// Name of the authentication middleware
    pub authenticate_name: String,
    /// Name of the authorization middleware factory
    pub authorize_name: String,
    /// Route files in the order they are read
    pub route_files: Vec<RouteFile>,
    /// Resource keyword -> tag name
    pub resource_tags: BTreeMap<String, String>,
    /// Tag name -> description
    pub tag_descriptions: BTreeMap<String, String>,
    pub type_overrides: BTreeMap<String, PrimitiveType>,
    /// Schema name -> definition
    pub schemas: BTreeMap<String, Schema>,
    /// Request body type name -> example payload
    pub examples: BTreeMap<String, Value>,
    pub include_examples: bool,
    /// Component name -> reusable query parameter
    pub shared_parameters: BTreeMap<String, ParameterObject>,
    /// HTTP status -> error response description
    pub error_responses: BTreeMap<String, String>,
    pub security_scheme_name: String,
    pub security_scheme: SecurityScheme,
    pub output: PathBuf,
    /// Paths the written document is expected to contain
    pub expected_paths: Vec<String>,
    /// Schemas the written document is expected to contain
    pub expected_schemas: Vec<String>,
}

/// One route source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFile {
    pub path: PathBuf,
    /// Tag for every route in the file, overriding the filename lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Mount prefix, overriding any `@prefix` in the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl RouteFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tag: None,
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl GeneratorConfig {
    /// Load a configuration file. Keys it does not set keep their default.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Configuration with an empty route file list, for callers that supply their own
    pub fn without_route_files() -> Self {
        Self {
            route_files: Vec::new(),
            ..Self::default()
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let route_files = [
            ("user", "users"),
            ("post", "posts"),
            ("category", "categories"),
            ("tag", "tags"),
            ("comment", "comments"),
        ]
        .into_iter()
        .map(|(resource, mount)| {
            RouteFile::new(format!("src/routes/{}.routes.ts", resource))
                .with_prefix(format!("/api/v1/{}", mount))
        })
        .collect();

        Self {
            info: Info {
                title: "博客系统 API".to_string(),
                version: "1.0.0".to_string(),
                description: Some(
                    "博客系统后端接口文档, 包含用户, 文章, 分类, 标签与评论管理".to_string(),
                ),
                contact: Some(Contact {
                    name: Some("API Support".to_string()),
                    email: Some("support@example.com".to_string()),
                    url: None,
                }),
            },
            servers: vec![
                Server {
                    url: "http://localhost:3000".to_string(),
                    description: Some("开发环境".to_string()),
                },
                Server {
                    url: "https://api.example.com".to_string(),
                    description: Some("生产环境".to_string()),
                },
            ],
            default_prefix: "/api/v1".to_string(),
            router_object: "router".to_string(),
            authenticate_name: "authenticate".to_string(),
            authorize_name: "authorize".to_string(),
            route_files,
            resource_tags: string_table(&[
                ("user", "Users"),
                ("auth", "Auth"),
                ("post", "Posts"),
                ("category", "Categories"),
                ("tag", "Tags"),
                ("comment", "Comments"),
                ("health", "Health"),
            ]),
            tag_descriptions: string_table(&[
                ("Users", "用户注册, 登录与个人资料管理"),
                ("Auth", "认证与令牌管理"),
                ("Posts", "文章的创建, 查询, 更新与删除"),
                ("Categories", "文章分类管理"),
                ("Tags", "文章标签管理"),
                ("Comments", "文章评论管理"),
                ("Health", "服务健康检查"),
            ]),
            type_overrides: BTreeMap::new(),
            schemas: default_schemas(),
            examples: default_examples(),
            include_examples: true,
            shared_parameters: default_shared_parameters(),
            error_responses: string_table(&[
                ("400", "请求参数错误"),
                ("401", "未认证或令牌无效"),
                ("403", "权限不足"),
                ("404", "资源不存在"),
                ("500", "服务器内部错误"),
            ]),
            security_scheme_name: "bearerAuth".to_string(),
            security_scheme: SecurityScheme {
                scheme_type: "http".to_string(),
                scheme: Some("bearer".to_string()),
                bearer_format: Some("JWT".to_string()),
                description: Some("在请求头中携带 Authorization: Bearer <token>".to_string()),
            },
            output: PathBuf::from(DEFAULT_OUTPUT),
            expected_paths: [
                "/api/v1/users/register",
                "/api/v1/users/login",
                "/api/v1/users/me",
                "/api/v1/posts",
                "/api/v1/posts/{id}",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            expected_schemas: [
                "User",
                "CreateUserDto",
                "LoginDto",
                "AuthResponse",
                "Post",
                "CreatePostDto",
                "ApiResponse",
                "ApiError",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

fn string_table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn string() -> Schema {
    Schema::primitive(PrimitiveType::String)
}

fn integer() -> Schema {
    Schema::primitive(PrimitiveType::Integer)
}

fn timestamp() -> Schema {
    Schema::primitive(PrimitiveType::DateTime)
}

fn default_schemas() -> BTreeMap<String, Schema> {
    let mut schemas = BTreeMap::new();

    schemas.insert(
        "User".to_string(),
        Schema::object(
            vec![
                ("id", string()),
                ("username", string()),
                ("email", string()),
                ("nickname", string()),
                ("avatar", string()),
                ("role", {
                    let mut role = string();
                    role.enum_values = Some(vec![json!("USER"), json!("EDITOR"), json!("ADMIN")]);
                    role
                }),
                ("createdAt", timestamp()),
                ("updatedAt", timestamp()),
            ],
            &["id", "username", "email", "role"],
        ),
    );
    schemas.insert(
        "AuthResponse".to_string(),
        Schema::object(
            vec![
                ("user", Schema::reference("User")),
                ("accessToken", string()),
                ("refreshToken", string()),
            ],
            &["user", "accessToken"],
        ),
    );
    schemas.insert(
        "CreateUserDto".to_string(),
        Schema::object(
            vec![
                ("username", string()),
                ("email", string()),
                ("password", string()),
                ("nickname", string()),
            ],
            &["username", "email", "password"],
        ),
    );
    schemas.insert(
        "LoginDto".to_string(),
        Schema::object(
            vec![("email", string()), ("password", string())],
            &["email", "password"],
        ),
    );
    schemas.insert(
        "UpdateUserDto".to_string(),
        Schema::object(
            vec![("nickname", string()), ("avatar", string()), ("bio", string())],
            &[],
        ),
    );
    schemas.insert(
        "ChangePasswordDto".to_string(),
        Schema::object(
            vec![("oldPassword", string()), ("newPassword", string())],
            &["oldPassword", "newPassword"],
        ),
    );
    schemas.insert(
        "Post".to_string(),
        Schema::object(
            vec![
                ("id", string()),
                ("title", string()),
                ("content", string()),
                ("summary", string()),
                ("status", {
                    let mut status = string();
                    status.enum_values =
                        Some(vec![json!("DRAFT"), json!("PUBLISHED"), json!("ARCHIVED")]);
                    status
                }),
                ("viewCount", integer()),
                ("author", Schema::reference("User")),
                ("category", Schema::reference("Category")),
                ("tags", Schema::array(Schema::reference("Tag"))),
                ("createdAt", timestamp()),
                ("updatedAt", timestamp()),
            ],
            &["id", "title", "content", "status"],
        ),
    );
    schemas.insert(
        "CreatePostDto".to_string(),
        Schema::object(
            vec![
                ("title", string()),
                ("content", string()),
                ("summary", string()),
                ("categoryId", string()),
                ("tagIds", Schema::array(string())),
                ("status", string()),
            ],
            &["title", "content"],
        ),
    );
    schemas.insert(
        "UpdatePostDto".to_string(),
        Schema::object(
            vec![
                ("title", string()),
                ("content", string()),
                ("summary", string()),
                ("categoryId", string()),
                ("tagIds", Schema::array(string())),
                ("status", string()),
            ],
            &[],
        ),
    );
    schemas.insert(
        "Category".to_string(),
        Schema::object(
            vec![
                ("id", string()),
                ("name", string()),
                ("slug", string()),
                ("description", string()),
                ("postCount", integer()),
            ],
            &["id", "name"],
        ),
    );
    schemas.insert(
        "CreateCategoryDto".to_string(),
        Schema::object(
            vec![("name", string()), ("slug", string()), ("description", string())],
            &["name"],
        ),
    );
    schemas.insert(
        "Tag".to_string(),
        Schema::object(
            vec![
                ("id", string()),
                ("name", string()),
                ("slug", string()),
                ("postCount", integer()),
            ],
            &["id", "name"],
        ),
    );
    schemas.insert(
        "CreateTagDto".to_string(),
        Schema::object(vec![("name", string()), ("slug", string())], &["name"]),
    );
    schemas.insert(
        "Comment".to_string(),
        Schema::object(
            vec![
                ("id", string()),
                ("content", string()),
                ("postId", string()),
                ("parentId", string()),
                ("author", Schema::reference("User")),
                ("createdAt", timestamp()),
            ],
            &["id", "content", "postId"],
        ),
    );
    schemas.insert(
        "CreateCommentDto".to_string(),
        Schema::object(
            vec![("content", string()), ("postId", string()), ("parentId", string())],
            &["content", "postId"],
        ),
    );

    schemas
}

fn default_examples() -> BTreeMap<String, Value> {
    let mut examples = BTreeMap::new();
    examples.insert(
        "CreateUserDto".to_string(),
        json!({
            "username": "zhangsan",
            "email": "zhangsan@example.com",
            "password": "Passw0rd!",
            "nickname": "张三"
        }),
    );
    examples.insert(
        "LoginDto".to_string(),
        json!({ "email": "zhangsan@example.com", "password": "Passw0rd!" }),
    );
    examples.insert(
        "UpdateUserDto".to_string(),
        json!({ "nickname": "小张", "bio": "热爱写作的开发者" }),
    );
    examples.insert(
        "ChangePasswordDto".to_string(),
        json!({ "oldPassword": "Passw0rd!", "newPassword": "N3wPassw0rd!" }),
    );
    examples.insert(
        "CreatePostDto".to_string(),
        json!({
            "title": "Rust 入门指南",
            "content": "本文介绍 Rust 的所有权与借用...",
            "summary": "Rust 基础概念",
            "categoryId": "c1a2b3",
            "tagIds": ["t1", "t2"],
            "status": "DRAFT"
        }),
    );
    examples.insert(
        "UpdatePostDto".to_string(),
        json!({ "title": "Rust 入门指南 (第二版)", "status": "PUBLISHED" }),
    );
    examples.insert(
        "CreateCategoryDto".to_string(),
        json!({ "name": "后端开发", "slug": "backend", "description": "服务端技术文章" }),
    );
    examples.insert(
        "CreateTagDto".to_string(),
        json!({ "name": "Rust", "slug": "rust" }),
    );
    examples.insert(
        "CreateCommentDto".to_string(),
        json!({ "content": "写得很好, 受益匪浅!", "postId": "p1a2b3" }),
    );
    examples
}

fn default_shared_parameters() -> BTreeMap<String, ParameterObject> {
    let mut page_schema = integer();
    page_schema.default = Some(json!(1));
    let mut limit_schema = integer();
    limit_schema.default = Some(json!(10));

    let mut parameters = BTreeMap::new();
    parameters.insert(
        "PageParam".to_string(),
        ParameterObject {
            name: "page".to_string(),
            location: "query".to_string(),
            description: Some("页码".to_string()),
            required: false,
            schema: page_schema,
        },
    );
    parameters.insert(
        "LimitParam".to_string(),
        ParameterObject {
            name: "limit".to_string(),
            location: "query".to_string(),
            description: Some("每页数量".to_string()),
            required: false,
            schema: limit_schema,
        },
    );
    parameters.insert(
        "KeywordParam".to_string(),
        ParameterObject {
            name: "keyword".to_string(),
            location: "query".to_string(),
            description: Some("搜索关键字".to_string()),
            required: false,
            schema: string(),
        },
    );
    parameters
}
