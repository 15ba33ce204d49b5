//! OpenAPI generator for Express route files.
//!
//! Route registrations such as `router.post('/batch', authenticate, ctrl.create.bind(ctrl))`
//! and the `/** ... */` comments above them are read as plain text, turned into
//! [`extractor::RouteInfo`] records and compiled into an OpenAPI 3.0 document.
//! Extraction is pattern based and best effort: a line or comment that cannot be
//! understood is skipped with a warning, never fatal.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Finds documentation comment blocks in source lines
//! 2. [`doc_comment`] - Reads summary, parameters and type names from a comment
//! 3. [`extractor`] - Recognises route registrations and pairs them with comments
//! 4. [`detector`] - Derives a route file's tag and mount prefix
//! 5. [`corpus`] - Reads the configured route files in order
//! 6. [`type_resolver`] - Maps type hints to schema primitives
//! 7. [`schema_generator`] - Builds parameter, request and response schemas
//! 8. [`openapi_builder`] - Assembles the OpenAPI document
//! 9. [`serializer`] - Writes the document as YAML or JSON
//! 10. [`validator`] - Re-reads and checks the written document
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_routes::{
//!     config::GeneratorConfig,
//!     corpus::CorpusBuilder,
//!     detector::ResourceDetector,
//!     openapi_builder::synthesize,
//!     serializer::serialize_yaml,
//! };
//!
//! let config = GeneratorConfig::default();
//! let detector = ResourceDetector::new(&config);
//! let corpus = CorpusBuilder::from_config("./blog-server", &config)
//!     .build(&config.route_files, &detector);
//!
//! let (document, report) = synthesize(&corpus.routes, &config);
//! for issue in &report.issues {
//!     eprintln!("{}", issue);
//! }
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```

pub mod cli;
pub mod config;
pub mod corpus;
pub mod detector;
pub mod doc_comment;
pub mod error;
pub mod extractor;
pub mod openapi_builder;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod type_resolver;
pub mod validator;
