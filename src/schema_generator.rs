use crate::extractor::Parameter;
use crate::type_resolver::{PrimitiveType, TypeRef, TypeResolver};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Envelope wrapping every successful single-resource response
pub const API_RESPONSE: &str = "ApiResponse";
/// Envelope wrapping every list response
pub const PAGINATED_RESPONSE: &str = "PaginatedResponse";
/// Body of responses that only carry a status message
pub const MESSAGE_RESPONSE: &str = "MessageResponse";
/// Body of every error response
pub const API_ERROR: &str = "ApiError";

const COMPONENT_PREFIX: &str = "#/components/schemas/";

/// Schema generator - builds OpenAPI schemas from symbolic type names
///
/// Request and response types are never resolved structurally. They become `$ref`
/// pointers, and the generator remembers every name it handed out so that
/// [`SchemaGenerator::into_schemas`] can emit a component for each of them.
pub struct SchemaGenerator {
    /// Maps parameter type tokens to primitives
    type_resolver: TypeResolver,
    /// Component definitions supplied by configuration
    known_schemas: BTreeMap<String, Schema>,
    /// Component names referenced so far
    referenced: BTreeSet<String>,
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to a component schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g. "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Required field names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Composition of several schemas
    #[serde(rename = "allOf", skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    /// Allowed values
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl Schema {
    /// A `$ref` to a component schema
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", COMPONENT_PREFIX, name)),
            ..Default::default()
        }
    }

    /// A schema for a primitive type
    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self {
            schema_type: Some(primitive.schema_type().to_string()),
            format: primitive.format().map(str::to_string),
            ..Default::default()
        }
    }

    /// An object schema with the given properties, in any order
    pub fn object<S: Into<String>>(properties: Vec<(S, Schema)>, required: &[&str]) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            properties: Some(
                properties
                    .into_iter()
                    .map(|(name, schema)| (name.into(), schema))
                    .collect(),
            ),
            required: if required.is_empty() {
                None
            } else {
                Some(required.iter().map(|r| r.to_string()).collect())
            },
            ..Default::default()
        }
    }

    /// An array of `items`
    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// `allOf` composition
    pub fn all_of(parts: Vec<Schema>) -> Self {
        Self {
            all_of: Some(parts),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Component name this schema points at, if it is a `$ref`
    pub fn referenced_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.strip_prefix(COMPONENT_PREFIX))
    }

    /// Every component name referenced anywhere inside this schema
    pub fn collect_references(&self, into: &mut BTreeSet<String>) {
        if let Some(name) = self.referenced_name() {
            into.insert(name.to_string());
        }
        if let Some(properties) = &self.properties {
            for property in properties.values() {
                property.collect_references(into);
            }
        }
        if let Some(items) = &self.items {
            items.collect_references(into);
        }
        if let Some(parts) = &self.all_of {
            for part in parts {
                part.collect_references(into);
            }
        }
    }
}

impl SchemaGenerator {
    /// Create a new SchemaGenerator with a TypeResolver and known component schemas
    pub fn new(type_resolver: TypeResolver, known_schemas: BTreeMap<String, Schema>) -> Self {
        debug!("Initializing SchemaGenerator with {} known schemas", known_schemas.len());
        Self {
            type_resolver,
            known_schemas,
            referenced: BTreeSet::new(),
        }
    }

    /// Schema for a parameter: its primitive type plus default and enum values
    pub fn parameter_schema(&self, param: &Parameter) -> Schema {
        let primitive = self.type_resolver.resolve(&param.type_name);
        let mut schema = Schema::primitive(primitive);
        schema.default = param
            .default_value
            .as_deref()
            .map(|raw| typed_value(primitive, raw));
        schema.enum_values = param
            .enum_values
            .as_ref()
            .map(|values| values.iter().map(|v| typed_value(primitive, v)).collect());
        schema
    }

    /// A `$ref` to a named component, remembered for [`Self::into_schemas`]
    pub fn reference(&mut self, name: &str) -> Schema {
        self.referenced.insert(name.to_string());
        Schema::reference(name)
    }

    /// Success response schema for an optional symbolic response type.
    ///
    /// `T[]` extends the paginated envelope with `T` items, `T` extends the single
    /// resource envelope with `T` data, and no type yields the bare envelope.
    pub fn response_schema(&mut self, response_type: Option<&str>) -> Schema {
        let Some(response_type) = response_type else {
            return self.reference(API_RESPONSE);
        };

        let type_ref = TypeRef::parse(response_type);
        let item = self.reference(&type_ref.name);

        if type_ref.is_array {
            Schema::all_of(vec![
                self.reference(PAGINATED_RESPONSE),
                Schema::object(
                    vec![(
                        "data",
                        Schema::object(vec![("items", Schema::array(item))], &[]),
                    )],
                    &[],
                ),
            ])
        } else {
            Schema::all_of(vec![
                self.reference(API_RESPONSE),
                Schema::object(vec![("data", item)], &[]),
            ])
        }
    }

    /// Consume the generator and produce `components.schemas`.
    ///
    /// Contains the generic envelopes and every referenced name, including names
    /// referenced from inside known schemas. Names without a known definition get a
    /// placeholder object so no `$ref` dangles.
    pub fn into_schemas(self) -> BTreeMap<String, Schema> {
        let mut schemas = generic_schemas();
        let mut pending: Vec<String> = self.referenced.into_iter().collect();

        while let Some(name) = pending.pop() {
            if schemas.contains_key(&name) {
                continue;
            }

            let schema = match self.known_schemas.get(&name) {
                Some(known) => known.clone(),
                None => {
                    warn!("No schema definition for '{}', emitting a placeholder", name);
                    Schema {
                        schema_type: Some("object".to_string()),
                        description: Some(format!("{} 数据结构", name)),
                        ..Default::default()
                    }
                }
            };

            let mut nested = BTreeSet::new();
            schema.collect_references(&mut nested);
            pending.extend(nested.into_iter().filter(|n| !schemas.contains_key(n)));
            schemas.insert(name, schema);
        }

        schemas
    }
}

/// Convert a raw default/enum token to a JSON value of the parameter's type
fn typed_value(primitive: PrimitiveType, raw: &str) -> Value {
    match primitive {
        PrimitiveType::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(raw)),
        PrimitiveType::Number => raw
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| raw.parse::<f64>().map(Value::from))
            .unwrap_or_else(|_| Value::from(raw)),
        PrimitiveType::Boolean => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::from(raw),
        },
        PrimitiveType::String | PrimitiveType::DateTime => Value::from(raw),
    }
}

/// The response envelopes every document carries
fn generic_schemas() -> BTreeMap<String, Schema> {
    let boolean = || Schema::primitive(PrimitiveType::Boolean);
    let string = || Schema::primitive(PrimitiveType::String);
    let integer = || Schema::primitive(PrimitiveType::Integer);

    let mut schemas = BTreeMap::new();
    schemas.insert(
        API_RESPONSE.to_string(),
        Schema::object(
            vec![
                ("success", boolean().with_example(Value::Bool(true))),
                ("message", string()),
                (
                    "data",
                    Schema::object(Vec::<(String, Schema)>::new(), &[]).with_description("响应数据"),
                ),
            ],
            &["success"],
        )
        .with_description("通用响应结构"),
    );
    schemas.insert(
        PAGINATED_RESPONSE.to_string(),
        Schema::all_of(vec![
            Schema::reference(API_RESPONSE),
            Schema::object(
                vec![(
                    "data",
                    Schema::object(
                        vec![
                            ("items", Schema::array(Schema::object(Vec::<(String, Schema)>::new(), &[]))),
                            ("total", integer()),
                            ("page", integer()),
                            ("limit", integer()),
                            ("totalPages", integer()),
                        ],
                        &["items", "total"],
                    ),
                )],
                &[],
            ),
        ])
        .with_description("分页响应结构"),
    );
    schemas.insert(
        MESSAGE_RESPONSE.to_string(),
        Schema::object(
            vec![
                ("success", boolean().with_example(Value::Bool(true))),
                ("message", string().with_example(Value::from("操作成功"))),
            ],
            &["success", "message"],
        ),
    );
    schemas.insert(
        API_ERROR.to_string(),
        Schema::object(
            vec![
                ("success", boolean().with_example(Value::Bool(false))),
                ("message", string()),
                ("code", string()),
                (
                    "errors",
                    Schema::array(Schema::object(
                        vec![("field", string()), ("message", string())],
                        &[],
                    )),
                ),
            ],
            &["success", "message"],
        )
        .with_description("错误响应结构"),
    );
    schemas
}
