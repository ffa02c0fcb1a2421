//! Type registry mapping definition-document type tags to constructors.
//!
//! The registry is an owned value, populated once at initialization via
//! [`TypeRegistry::with_builtins`] and handed to the
//! [`Resolver`](crate::resolver::Resolver). There is no global mutable
//! state and no import-order dependence: extending the engine with a new
//! artifact or processor variant means calling
//! [`register_artifact`](TypeRegistry::register_artifact) or
//! [`register_processor`](TypeRegistry::register_processor) before
//! resolving.
//!
//! # Examples
//!
//! ```rust
//! use sluice::data::{Artifact, FileArtifact};
//! use sluice::registry::TypeRegistry;
//!
//! #[derive(Debug)]
//! struct AlwaysThere;
//! impl Artifact for AlwaysThere {
//!     fn exists(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let mut registry = TypeRegistry::with_builtins();
//! registry.register_artifact("constant", |_name, _params| Ok(Box::new(AlwaysThere)));
//! assert!(registry.has_artifact_type("constant"));
//! assert!(registry.has_artifact_type("file"));
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::data::{Artifact, FileArtifact};
use crate::processor::{CommandProcessor, NoopProcessor, Processor};
use crate::resolver::ResolveError;

/// Tag applied to data entries that omit `type`.
pub const DEFAULT_DATA_TYPE: &str = "file";
/// Built-in filesystem-existence data type.
pub const FILE_DATA_TYPE: &str = "file";
/// Built-in shell-command processor type.
pub const COMMAND_PROCESSOR_TYPE: &str = "command";
/// Built-in no-op processor type.
pub const NOOP_PROCESSOR_TYPE: &str = "noop";

/// Raw type-specific parameters of a definition entry.
pub type Params = serde_json::Map<String, Value>;

type ArtifactCtor = Box<dyn Fn(&str, &Params) -> Result<Box<dyn Artifact>, ResolveError> + Send + Sync>;
type ProcessorCtor = Box<dyn Fn(&str, &Params) -> Result<Arc<dyn Processor>, ResolveError> + Send + Sync>;

/// Tag-to-constructor registry for artifact and processor types.
pub struct TypeRegistry {
    artifacts: FxHashMap<String, ArtifactCtor>,
    processors: FxHashMap<String, ProcessorCtor>,
}

impl TypeRegistry {
    /// An empty registry with no types at all. Mostly useful in tests;
    /// production callers want [`with_builtins`](Self::with_builtins).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            artifacts: FxHashMap::default(),
            processors: FxHashMap::default(),
        }
    }

    /// Registry with the built-in types installed: `file` artifacts and
    /// the `command` / `noop` processors.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_artifact(FILE_DATA_TYPE, |name, params| {
            let FileParams { path } = from_params(name, params)?;
            Ok(Box::new(FileArtifact::new(path)))
        });
        registry.register_processor(NOOP_PROCESSOR_TYPE, |name, _params| {
            Ok(Arc::new(NoopProcessor::new(name)))
        });
        registry.register_processor(COMMAND_PROCESSOR_TYPE, |name, params| {
            let CommandParams { command } = from_params(name, params)?;
            Ok(match command {
                CommandField::One(command) => Arc::new(CommandProcessor::new(name, command)),
                CommandField::Chain(commands) => {
                    Arc::new(CommandProcessor::chained(name, commands))
                }
            })
        });
        registry
    }

    /// Install (or replace) an artifact constructor for `tag`.
    pub fn register_artifact<F>(&mut self, tag: impl Into<String>, ctor: F)
    where
        F: Fn(&str, &Params) -> Result<Box<dyn Artifact>, ResolveError> + Send + Sync + 'static,
    {
        self.artifacts.insert(tag.into(), Box::new(ctor));
    }

    /// Install (or replace) a processor constructor for `tag`.
    pub fn register_processor<F>(&mut self, tag: impl Into<String>, ctor: F)
    where
        F: Fn(&str, &Params) -> Result<Arc<dyn Processor>, ResolveError> + Send + Sync + 'static,
    {
        self.processors.insert(tag.into(), Box::new(ctor));
    }

    pub fn has_artifact_type(&self, tag: &str) -> bool {
        self.artifacts.contains_key(tag)
    }

    pub fn has_processor_type(&self, tag: &str) -> bool {
        self.processors.contains_key(tag)
    }

    /// Build an artifact for the data node `name` from its raw parameters.
    pub fn build_artifact(
        &self,
        tag: &str,
        name: &str,
        params: &Params,
    ) -> Result<Box<dyn Artifact>, ResolveError> {
        let ctor = self
            .artifacts
            .get(tag)
            .ok_or_else(|| ResolveError::UnknownDataType {
                tag: tag.to_string(),
                name: name.to_string(),
            })?;
        ctor(name, params)
    }

    /// Build a processor `name` from its raw parameters.
    pub fn build_processor(
        &self,
        tag: &str,
        name: &str,
        params: &Params,
    ) -> Result<Arc<dyn Processor>, ResolveError> {
        let ctor = self
            .processors
            .get(tag)
            .ok_or_else(|| ResolveError::UnknownProcessorType {
                tag: tag.to_string(),
                name: name.to_string(),
            })?;
        ctor(name, params)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("artifacts", &self.artifacts.keys().collect::<Vec<_>>())
            .field("processors", &self.processors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Deserialize the type-specific fields of an entry, attributing failures
/// to the entry by name.
fn from_params<T: serde::de::DeserializeOwned>(
    name: &str,
    params: &Params,
) -> Result<T, ResolveError> {
    serde_json::from_value(Value::Object(params.clone())).map_err(|source| {
        ResolveError::InvalidParams {
            name: name.to_string(),
            source,
        }
    })
}

#[derive(Deserialize)]
struct FileParams {
    path: PathBuf,
}

#[derive(Deserialize)]
struct CommandParams {
    command: CommandField,
}

/// `command` accepts a single string or a list chained with `" && "`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CommandField {
    One(String),
    Chain(Vec<String>),
}
