//! Handler declarations and catalog seed location

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::adapters::storage::{CatalogSeed, InMemoryCatalog};
use crate::domain::routing::{ConfigurationError, HandlerDescriptor, HandlerRegistry};

/// Declared handlers.
///
/// Absent means the built-in descriptors, all enabled. A present list
/// replaces them entirely and must be valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct HandlersConfig(Option<Vec<HandlerDescriptor>>);

impl HandlersConfig {
    pub fn declared(descriptors: Vec<HandlerDescriptor>) -> Self {
        Self(Some(descriptors))
    }

    pub fn is_declared(&self) -> bool {
        self.0.is_some()
    }

    /// Builds the immutable registry.
    ///
    /// # Errors
    ///
    /// Any [`ConfigurationError`] from the declared list.
    pub fn registry(&self) -> Result<HandlerRegistry, ConfigurationError> {
        match &self.0 {
            Some(descriptors) => HandlerRegistry::new(descriptors.clone()),
            None => Ok(HandlerRegistry::with_defaults()),
        }
    }
}

/// Catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// YAML file with products and reviews
    #[serde(default = "default_seed_file")]
    pub seed_file: PathBuf,
}

impl CatalogConfig {
    /// Loads the seeded catalog. A missing or unreadable seed yields an empty
    /// catalog.
    pub fn load(&self) -> InMemoryCatalog {
        load_seed(&self.seed_file)
    }
}

fn load_seed(path: &Path) -> InMemoryCatalog {
    match CatalogSeed::from_file(path) {
        Ok(seed) => {
            tracing::info!(
                path = %path.display(),
                products = seed.products.len(),
                reviews = seed.reviews.len(),
                "Catalog seed loaded"
            );
            InMemoryCatalog::from_seed(seed)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Catalog seed unavailable, starting with an empty catalog");
            InMemoryCatalog::new()
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            seed_file: default_seed_file(),
        }
    }
}

fn default_seed_file() -> PathBuf {
    PathBuf::from("data/catalog.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::HandlerId;
    use crate::ports::ProductCatalog;
    use std::io::Write;

    fn descriptor(id: &str, enabled: bool) -> HandlerDescriptor {
        HandlerDescriptor {
            id: HandlerId::new(id).unwrap(),
            name: id.to_string(),
            description: format!("questions about {}", id),
            enabled,
        }
    }

    #[test]
    fn absent_handlers_use_builtins() {
        let registry = HandlersConfig::default().registry().unwrap();
        assert_eq!(registry.enabled_handlers().len(), 3);
    }

    #[test]
    fn declared_handlers_replace_builtins() {
        let config = HandlersConfig::declared(vec![
            descriptor("orders", true),
            descriptor("reviews", false),
        ]);
        let registry = config.registry().unwrap();
        assert_eq!(registry.enabled_handlers().len(), 1);
        assert!(registry.get("reviews").is_some());
        assert!(registry.is_enabled("orders"));
        assert!(!registry.is_enabled("reviews"));
    }

    #[test]
    fn declared_but_all_disabled_is_fatal() {
        let config = HandlersConfig::declared(vec![descriptor("orders", false)]);
        assert_eq!(config.registry().unwrap_err(), ConfigurationError::NoEnabledHandlers);
    }

    #[test]
    fn handlers_deserialize_from_yaml_list() {
        let yaml = "- id: reviews\n  name: Reviews\n  description: Customer reviews\n";
        let config: HandlersConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.is_declared());
        assert!(config.registry().unwrap().get("reviews").is_some_and(|d| d.enabled));
    }

    #[tokio::test]
    async fn catalog_loads_from_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "products:\n  - id: test-bed\n    name: Test Bed\n    price: 100.0\n    type: Foam\n    available_sizes: [Queen]\n    warranty: 10 years\n    trial_period: 100 nights"
        )
        .unwrap();
        let config = CatalogConfig {
            seed_file: file.path().to_path_buf(),
        };

        let catalog = config.load();

        assert_eq!(catalog.list_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_seed_gives_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let config = CatalogConfig {
            seed_file: dir.path().join("absent.yaml"),
        };

        let catalog = config.load();

        assert!(catalog.list_products().await.unwrap().is_empty());
    }
}
