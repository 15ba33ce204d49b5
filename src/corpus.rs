use crate::config::{GeneratorConfig, RouteFile};
use crate::detector::ResourceDetector;
use crate::extractor::express::{ExpressExtractor, RouteLineExtractor};
use crate::extractor::{RouteExtractor, RouteInfo};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Collects routes from an ordered list of route files
pub struct CorpusBuilder {
    root: PathBuf,
    extractor: Box<dyn RouteExtractor>,
}

/// All routes of a run, in file order then source order
#[derive(Debug, Default)]
pub struct Corpus {
    pub routes: Vec<RouteInfo>,
    /// Files read successfully
    pub files_read: Vec<PathBuf>,
    /// Soft problems such as missing files
    pub warnings: Vec<String>,
}

impl CorpusBuilder {
    /// Create a builder resolving route files against `root`
    pub fn new(root: impl Into<PathBuf>, extractor: Box<dyn RouteExtractor>) -> Self {
        Self {
            root: root.into(),
            extractor,
        }
    }

    /// Builder with the Express extractor set up from the configuration
    pub fn from_config(root: impl Into<PathBuf>, config: &GeneratorConfig) -> Self {
        let line_extractor = RouteLineExtractor::new(
            &config.router_object,
            &config.authenticate_name,
            &config.authorize_name,
        );
        Self::new(root, Box::new(ExpressExtractor::new(line_extractor)))
    }

    /// Read every file in order. Missing or unreadable files are warned about and skipped.
    pub fn build(&self, route_files: &[RouteFile], detector: &ResourceDetector) -> Corpus {
        let mut corpus = Corpus::default();

        for route_file in route_files {
            let path = self.resolve(&route_file.path);
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) => {
                    let warning = format!("Skipping route file {}: {}", path.display(), e);
                    warn!("{}", warning);
                    corpus.warnings.push(warning);
                    continue;
                }
            };

            let context = detector.detect(route_file, &source);
            let mut routes = self.extractor.extract_routes(&source, &route_file.path);
            for route in &mut routes {
                route.tags = context.tags.clone();
                route.route_prefix = context.prefix.clone();
            }

            info!("{}: {} routes", route_file.path.display(), routes.len());
            corpus.routes.extend(routes);
            corpus.files_read.push(path);
        }

        debug!(
            "Corpus holds {} routes from {} files",
            corpus.routes.len(),
            corpus.files_read.len()
        );
        corpus
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
