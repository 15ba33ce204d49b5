//! Post-write validation of a generated document.
//!
//! The written file is read back and parsed as plain structured data, so the
//! checks see exactly what downstream tools will see.

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::openapi_builder::OpenApiDocument;
use crate::serializer::OutputFormat;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

/// Checks a written document against the structural invariants and the
/// configured expectations
pub struct DocumentValidator<'a> {
    config: &'a GeneratorConfig,
}

/// What validation found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub openapi_version: Option<String>,
    pub title: Option<String>,
    pub server_count: usize,
    pub tag_count: usize,
    pub path_count: usize,
    pub schema_count: usize,
    pub declared_tags: BTreeSet<String>,
    /// Non-fatal findings
    pub warnings: Vec<String>,
    /// Findings that fail validation
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn recorded errors into [`Error::Validation`]
    pub fn into_result(self) -> Result<Self> {
        if self.errors.is_empty() {
            Ok(self)
        } else {
            Err(Error::Validation(self.errors))
        }
    }

    /// Log the summary lines
    pub fn log_summary(&self) {
        info!(
            "OpenAPI 版本: {}",
            self.openapi_version.as_deref().unwrap_or("<missing>")
        );
        info!("API 标题: {}", self.title.as_deref().unwrap_or("<missing>"));
        info!("服务器数量: {}", self.server_count);
        info!("标签数量: {}", self.tag_count);
        info!("路径数量: {}", self.path_count);
        info!("组件模式数量: {}", self.schema_count);
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}

impl<'a> DocumentValidator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Read a written document back and validate it.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse. Findings inside a
    /// readable document are returned in the report instead.
    pub fn validate_file(&self, path: &Path) -> Result<ValidationReport> {
        self.validate_file_as(path, OutputFormat::from_path(path))
    }

    /// Like [`Self::validate_file`], but parses the file as `format` whatever
    /// its extension says.
    pub fn validate_file_as(&self, path: &Path, format: OutputFormat) -> Result<ValidationReport> {
        debug!("Validating {} as {:?}", path.display(), format);
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let value: Value = match format {
            OutputFormat::Json => serde_json::from_str(&content)?,
            OutputFormat::Yaml => serde_yaml::from_str(&content)?,
        };
        Ok(self.validate_value(&value))
    }

    /// Validate a parsed document
    pub fn validate_value(&self, value: &Value) -> ValidationReport {
        let mut report = ValidationReport {
            openapi_version: value["openapi"].as_str().map(str::to_string),
            title: value["info"]["title"].as_str().map(str::to_string),
            server_count: array_len(&value["servers"]),
            tag_count: array_len(&value["tags"]),
            path_count: object_len(&value["paths"]),
            schema_count: object_len(&value["components"]["schemas"]),
            declared_tags: value["tags"]
                .as_array()
                .map(|tags| {
                    tags.iter()
                        .filter_map(|t| t["name"].as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            ..ValidationReport::default()
        };

        if report.openapi_version.is_none() {
            report.errors.push("缺少 openapi 版本字段".to_string());
        }
        if report.title.is_none() {
            report.errors.push("缺少 info.title 字段".to_string());
        }
        if report.path_count == 0 {
            report.warnings.push("文档中没有任何路径".to_string());
        }

        self.check_tags(value, &mut report);
        self.check_expectations(value, &mut report);
        report
    }

    /// Compare what was read back with the in-memory document
    pub fn check_round_trip(&self, report: &mut ValidationReport, document: &OpenApiDocument) {
        if report.path_count != document.paths.len() {
            report.errors.push(format!(
                "路径数量不一致: 写入 {} 个, 读回 {} 个",
                document.paths.len(),
                report.path_count
            ));
        }
        let expected_tags = document.tag_names();
        if report.declared_tags != expected_tags {
            report.errors.push(format!(
                "标签集合不一致: 写入 {:?}, 读回 {:?}",
                expected_tags, report.declared_tags
            ));
        }
    }

    fn check_tags(&self, value: &Value, report: &mut ValidationReport) {
        let Some(paths) = value["paths"].as_object() else {
            return;
        };

        let mut dangling = BTreeSet::new();
        for (path, item) in paths {
            for method in METHODS {
                let Some(tags) = item[method]["tags"].as_array() else {
                    continue;
                };
                for tag in tags.iter().filter_map(Value::as_str) {
                    if !report.declared_tags.contains(tag) && dangling.insert(tag.to_string()) {
                        report.errors.push(format!(
                            "{} {} 引用了未声明的标签: {}",
                            method.to_uppercase(),
                            path,
                            tag
                        ));
                    }
                }
            }
        }
    }

    fn check_expectations(&self, value: &Value, report: &mut ValidationReport) {
        for path in &self.config.expected_paths {
            if value["paths"].get(path).is_none() {
                report.warnings.push(format!("路径缺失: {}", path));
            }
        }
        for schema in &self.config.expected_schemas {
            if value["components"]["schemas"].get(schema).is_none() {
                report.warnings.push(format!("组件缺失: {}", schema));
            }
        }
        let scheme = &self.config.security_scheme_name;
        if value["components"]["securitySchemes"].get(scheme).is_none() {
            report.warnings.push(format!("安全方案缺失: {}", scheme));
        }
    }
}

fn array_len(value: &Value) -> usize {
    value.as_array().map(Vec::len).unwrap_or(0)
}

fn object_len(value: &Value) -> usize {
    value.as_object().map(|o| o.len()).unwrap_or(0)
}
