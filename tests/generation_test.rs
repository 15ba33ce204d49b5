use openapi_from_routes::{
    config::{GeneratorConfig, RouteFile},
    corpus::{Corpus, CorpusBuilder},
    detector::ResourceDetector,
    extractor::{HttpMethod, ANONYMOUS_HANDLER},
    openapi_builder::{synthesize, OpenApiDocument, ParameterOrRef, StructuralIssue, SynthesisReport},
    serializer::{serialize_json, serialize_yaml, write_to_file},
    validator::DocumentValidator,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Helper function to create a temporary project with route files under src/routes
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (name, content) in files {
        let file_path = temp_dir.path().join("src/routes").join(name);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn blog_project() -> TempDir {
    create_test_project(vec![
        ("user.routes.ts", include_str!("fixtures/user.routes.ts")),
        ("post.routes.ts", include_str!("fixtures/post.routes.ts")),
        ("tag.routes.ts", include_str!("fixtures/tag.routes.ts")),
    ])
}

fn collect(temp_dir: &TempDir, config: &GeneratorConfig) -> Corpus {
    let detector = ResourceDetector::new(config);
    CorpusBuilder::from_config(temp_dir.path(), config).build(&config.route_files, &detector)
}

fn generate(temp_dir: &TempDir, config: &GeneratorConfig) -> (OpenApiDocument, SynthesisReport) {
    let corpus = collect(temp_dir, config);
    synthesize(&corpus.routes, config)
}

#[test]
fn test_blog_corpus_skips_missing_files() {
    let temp_dir = blog_project();
    let config = GeneratorConfig::default();

    let corpus = collect(&temp_dir, &config);

    // category and comment route files do not exist
    assert_eq!(corpus.warnings.len(), 2);
    assert_eq!(corpus.files_read.len(), 3);
    assert_eq!(corpus.routes.len(), 15);

    let first = &corpus.routes[0];
    assert_eq!(first.method, HttpMethod::Post);
    assert_eq!(first.path, "/register");
    assert_eq!(first.route_prefix, "/api/v1/users");
    assert_eq!(first.tags, vec!["Users"]);
}

#[test]
fn test_blog_end_to_end_generation() {
    let temp_dir = blog_project();
    let config = GeneratorConfig::default();

    let (doc, report) = generate(&temp_dir, &config);

    assert!(report.issues.is_empty(), "{:?}", report.issues);
    assert_eq!(report.route_count, 15);
    assert_eq!(report.operation_count, 15);

    let tag_names: Vec<&str> = doc.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tag_names, vec!["Users", "Posts", "Tags"]);
    assert_eq!(doc.tags[1].description.as_deref(), Some("文章的创建, 查询, 更新与删除"));

    let post_group = report
        .tag_groups
        .iter()
        .find(|(tag, _)| tag == "Posts")
        .map(|(_, ids)| ids.clone())
        .unwrap();
    assert_eq!(
        post_group,
        vec![
            "getPosts",
            "getPostsById",
            "postPosts",
            "putPostsById",
            "deletePostsById",
            "getPostsByIdComments"
        ]
    );

    for path in &config.expected_paths {
        assert!(doc.paths.contains_key(path), "missing {}", path);
    }
    for schema in &config.expected_schemas {
        assert!(doc.components.schemas.contains_key(schema), "missing {}", schema);
    }
}

#[test]
fn test_scenario_simple_public_route() {
    let temp_dir = blog_project();
    let (doc, _) = generate(&temp_dir, &GeneratorConfig::default());

    let op = doc.paths["/api/v1/tags/all"].get.as_ref().unwrap();
    assert_eq!(op.summary, "获取所有标签");
    assert!(op.security.is_none());
    assert_eq!(op.handler.as_deref(), Some("ctrl.getAll"));
    assert!(op.responses.contains_key("200"));
    assert!(!op.responses.contains_key("401"));
}

#[test]
fn test_scenario_protected_route_with_roles() {
    let temp_dir = blog_project();
    let (doc, _) = generate(&temp_dir, &GeneratorConfig::default());

    let op = doc.paths["/api/v1/tags/batch"].post.as_ref().unwrap();
    assert!(op.security.as_ref().unwrap()[0].contains_key("bearerAuth"));
    assert!(op
        .description
        .as_deref()
        .unwrap()
        .ends_with("所需角色: EDITOR, ADMIN"));
    assert_eq!(op.handler.as_deref(), Some("ctrl.create"));
    for status in ["201", "400", "401", "403", "500"] {
        assert!(op.responses.contains_key(status), "missing {}", status);
    }

    let body = &op.request_body.as_ref().unwrap().content["application/json"];
    assert_eq!(body.schema.schema_type.as_deref(), Some("array"));
    assert!(body.example.is_some());
}

#[test]
fn test_post_routes_details() {
    let temp_dir = blog_project();
    let (doc, _) = generate(&temp_dir, &GeneratorConfig::default());

    let list = doc.paths["/api/v1/posts"].get.as_ref().unwrap();
    assert_eq!(list.summary, "获取文章列表");
    assert_eq!(
        list.description.as_deref(),
        Some("获取文章列表\n支持分页, 分类筛选与关键字搜索")
    );
    assert_eq!(list.parameters.len(), 4);
    assert_eq!(
        list.parameters[0],
        ParameterOrRef::Reference {
            reference: "#/components/parameters/PageParam".to_string()
        }
    );
    match &list.parameters[2] {
        ParameterOrRef::Inline(sort) => {
            assert_eq!(sort.name, "sort");
            assert_eq!(sort.schema.enum_values.as_ref().map(Vec::len), Some(3));
            assert_eq!(sort.schema.default, Some(serde_json::json!("latest")));
        }
        other => panic!("unexpected parameter {:?}", other),
    }
    match &list.parameters[3] {
        ParameterOrRef::Inline(category) => {
            assert_eq!(category.name, "categoryId");
            assert!(!category.required);
        }
        other => panic!("unexpected parameter {:?}", other),
    }

    let create = doc.paths["/api/v1/posts"].post.as_ref().unwrap();
    assert!(create.description.as_deref().unwrap().contains("EDITOR, ADMIN"));

    let update = doc.paths["/api/v1/posts/{id}"].put.as_ref().unwrap();
    assert!(update.description.as_deref().unwrap().ends_with("所需角色: EDITOR, ADMIN"));

    let delete = doc.paths["/api/v1/posts/{id}"].delete.as_ref().unwrap();
    let schema = &delete.responses["200"].content.as_ref().unwrap()["application/json"].schema;
    assert_eq!(schema.referenced_name(), Some("MessageResponse"));
    assert!(delete.responses.contains_key("404"));

    let comments = doc.paths["/api/v1/posts/{id}/comments"].get.as_ref().unwrap();
    assert_eq!(comments.handler.as_deref(), Some(ANONYMOUS_HANDLER));
    // :id is declared even though the comment does not mention it
    assert_eq!(comments.parameters.len(), 1);
}

#[test]
fn test_deprecated_route_without_summary() {
    let temp_dir = blog_project();
    let (doc, _) = generate(&temp_dir, &GeneratorConfig::default());

    let op = doc.paths["/api/v1/users/profile/{username}"].get.as_ref().unwrap();
    assert_eq!(op.deprecated, Some(true));
    assert_eq!(op.summary, "GET /api/v1/users/profile/{username}");
    assert_eq!(op.handler.as_deref(), Some("getProfile"));
}

#[test]
fn test_generation_is_idempotent() {
    let temp_dir = blog_project();
    let config = GeneratorConfig::default();

    let (first, _) = generate(&temp_dir, &config);
    let (second, _) = generate(&temp_dir, &config);

    assert_eq!(serialize_yaml(&first).unwrap(), serialize_yaml(&second).unwrap());
    assert_eq!(serialize_json(&first).unwrap(), serialize_json(&second).unwrap());
}

#[test]
fn test_round_trip_validation() {
    let temp_dir = blog_project();
    let config = GeneratorConfig::default();
    let (doc, _) = generate(&temp_dir, &config);
    let validator = DocumentValidator::new(&config);

    for (file, content) in [
        ("docs/openapi.yaml", serialize_yaml(&doc).unwrap()),
        ("docs/openapi.json", serialize_json(&doc).unwrap()),
    ] {
        let path = temp_dir.path().join(file);
        write_to_file(&content, &path).unwrap();

        let mut report = validator.validate_file(&path).unwrap();
        validator.check_round_trip(&mut report, &doc);

        assert!(report.is_valid(), "{}: {:?}", file, report.errors);
        assert!(report.warnings.is_empty(), "{}: {:?}", file, report.warnings);
        assert_eq!(report.path_count, doc.paths.len());
        assert_eq!(report.declared_tags, doc.tag_names());
        assert_eq!(report.openapi_version.as_deref(), Some("3.0.3"));
    }
}

#[test]
fn test_duplicate_route_across_files() {
    let temp_dir = create_test_project(vec![
        ("post.routes.ts", include_str!("fixtures/post.routes.ts")),
        ("article.routes.ts", include_str!("fixtures/article.routes.ts")),
    ]);
    let config = GeneratorConfig {
        route_files: vec![
            RouteFile::new("src/routes/post.routes.ts").with_prefix("/api/v1/posts"),
            RouteFile::new("src/routes/article.routes.ts")
                .with_prefix("/api/v1/posts")
                .with_tag("Posts"),
        ],
        ..GeneratorConfig::default()
    };

    let (doc, report) = generate(&temp_dir, &config);

    assert_eq!(report.route_count, 7);
    assert_eq!(report.operation_count, 6);
    assert!(report
        .issues
        .iter()
        .any(|issue| matches!(issue, StructuralIssue::DuplicateRoute { method: HttpMethod::Get, path, .. } if path == "/api/v1/posts/{id}")));

    let op = doc.paths["/api/v1/posts/{id}"].get.as_ref().unwrap();
    assert_eq!(op.summary, "获取文章详情 (旧版)");
    assert_eq!(op.operation_id, "getPostsById2");
}

#[test]
fn test_empty_route_file_list() {
    let temp_dir = TempDir::new().unwrap();
    let config = GeneratorConfig::without_route_files();

    let (doc, report) = generate(&temp_dir, &config);
    assert!(doc.paths.is_empty());
    assert_eq!(report.route_count, 0);

    let path = temp_dir.path().join("docs/openapi.yaml");
    write_to_file(&serialize_yaml(&doc).unwrap(), &path).unwrap();

    let validator = DocumentValidator::new(&config);
    let mut validation = validator.validate_file(&path).unwrap();
    validator.check_round_trip(&mut validation, &doc);

    assert!(validation.is_valid(), "{:?}", validation.errors);
    assert!(validation.warnings.contains(&"文档中没有任何路径".to_string()));
}
