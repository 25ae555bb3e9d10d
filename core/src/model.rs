//! Model registry: the core's interface to a higher-level ORM layer.
//!
//! A model is registered once under a canonical dotted name plus aliases and
//! instantiated later against an injected executor. The schema arrives as
//! JSON data; mapping host-language structures onto that description is the
//! caller's concern.

use crate::builder::Builder;
use crate::error::{QuernError, Result};
use crate::executor::Executor;
use crate::grammar::Grammar;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// JSON-described model schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSchema {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub columns: Vec<ModelColumn>,
}

/// One column of a model schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelColumn {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: Option<String>,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A registered model factory. Immutable once stored; re-registering a name
/// replaces the factory (last write wins).
#[derive(Debug, Clone)]
pub struct ModelFactory {
    pub namespace: String,
    pub name: String,
    pub schema: Option<ModelSchema>,
    pub flow: Option<serde_json::Value>,
}

impl ModelFactory {
    /// The canonical dotted name.
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// A model instance bound to an executor.
pub struct Model {
    factory: Arc<ModelFactory>,
    grammar: Arc<dyn Grammar>,
    executor: Arc<dyn Executor>,
    attributes: IndexMap<String, Value>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("factory", &self.factory)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl Model {
    pub fn name(&self) -> &str {
        &self.factory.name
    }

    /// The table this model maps to: the schema's table name, falling back
    /// to the model name.
    pub fn table(&self) -> &str {
        self.factory
            .schema
            .as_ref()
            .and_then(|s| s.table.as_deref())
            .unwrap_or(&self.factory.name)
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Sets one attribute; unknown attribute names are a usage error.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self.attributes.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(QuernError::model(format!(
                "model `{}` has no attribute `{name}`",
                self.factory.fullname()
            ))),
        }
    }

    /// A query builder bound to this model's table and executor.
    pub fn query(&self) -> Builder {
        let mut builder =
            Builder::with_executor(Arc::clone(&self.grammar), Arc::clone(&self.executor));
        builder.table(self.table());
        builder
    }
}

/// Splits a registered name into `(fullname, namespace, name)`. Both `.` and
/// `/` act as namespace separators; a leading `*` (pointer-ish spellings
/// from host bindings) is dropped and the whole name lowercased.
fn prepare_names(name: &str) -> (String, String, String) {
    let sep = if name.contains('/') { '/' } else { '.' };
    let name = name.trim_start_matches('*').to_lowercase();
    let parts: Vec<&str> = name.split(sep).collect();
    if parts.len() <= 1 {
        return (name.clone(), String::new(), name);
    }
    let fullname = parts.join(".");
    let namespace = parts[..parts.len() - 1].join(".");
    let short = parts[parts.len() - 1].to_owned();
    (fullname, namespace, short)
}

fn registry() -> &'static RwLock<HashMap<String, Arc<ModelFactory>>> {
    static MODELS: OnceLock<RwLock<HashMap<String, Arc<ModelFactory>>>> = OnceLock::new();
    MODELS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers a model factory under the origin name and its canonical dotted
/// alias. `schema_json` and `flow_json` are parsed JSON documents.
pub fn register(name: &str, schema_json: Option<&[u8]>, flow_json: Option<&[u8]>) -> Result<()> {
    let (fullname, namespace, short) = prepare_names(name);
    let schema = match schema_json {
        Some(bytes) => Some(serde_json::from_slice::<ModelSchema>(bytes)?),
        None => None,
    };
    let flow = match flow_json {
        Some(bytes) => Some(serde_json::from_slice::<serde_json::Value>(bytes)?),
        None => None,
    };
    let factory = Arc::new(ModelFactory {
        namespace,
        name: short,
        schema,
        flow,
    });
    let mut models = registry()
        .write()
        .map_err(|_| QuernError::model("model registry poisoned"))?;
    models.insert(name.to_owned(), Arc::clone(&factory));
    models.insert(fullname, factory);
    Ok(())
}

/// Instantiates a registered model bound to the given grammar and executor.
/// Attributes default to null, one per schema column.
pub fn make(name: &str, grammar: Arc<dyn Grammar>, executor: Arc<dyn Executor>) -> Result<Model> {
    let (fullname, _, _) = prepare_names(name);
    let models = registry()
        .read()
        .map_err(|_| QuernError::model("model registry poisoned"))?;
    let factory = models
        .get(name)
        .or_else(|| models.get(&fullname))
        .cloned()
        .ok_or_else(|| QuernError::model(format!("model `{name}` is not registered")))?;
    drop(models);

    let mut attributes = IndexMap::new();
    if let Some(schema) = &factory.schema {
        for column in &schema.columns {
            attributes.insert(column.name.clone(), Value::Null);
        }
    }
    Ok(Model {
        factory,
        grammar,
        executor,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_names_plain() {
        assert_eq!(
            prepare_names("user"),
            ("user".into(), "".into(), "user".into())
        );
    }

    #[test]
    fn test_prepare_names_dotted_and_slashed() {
        assert_eq!(
            prepare_names("App.User"),
            ("app.user".into(), "app".into(), "user".into())
        );
        assert_eq!(
            prepare_names("app/models/user"),
            ("app.models.user".into(), "app.models".into(), "user".into())
        );
    }

    #[test]
    fn test_prepare_names_strips_pointer_prefix() {
        assert_eq!(prepare_names("*Member").0, "member");
    }
}
