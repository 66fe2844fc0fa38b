//! File-backed topology store queried with compiled [`Filters`].

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::filters::{Filters, evaluate_filters};
use crate::utils::cat_labels;

/// Kind of topology object a query targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    /// Any object type
    #[default]
    Unspecified,
    Entity,
    Relation,
    Kind,
}

impl ObjectType {
    /// Whether kind filters apply to queries over this type.
    pub fn targets_kinds(self) -> bool {
        matches!(self, ObjectType::Kind | ObjectType::Relation)
    }

    pub fn label(self) -> &'static str {
        match self {
            ObjectType::Unspecified => "object",
            ObjectType::Entity => "entity",
            ObjectType::Relation => "relation",
            ObjectType::Kind => "kind",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopoObject {
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Relation source object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Relation target object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TopoStore {
    #[serde(default)]
    pub objects: Vec<TopoObject>,
}

impl TopoStore {
    /// Load a YAML (or JSON) document of the form `{ objects: [...] }`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Topo: Failed to open topology file {:?}", path))?;
        let store: TopoStore = serde_yaml::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Topo: Failed to parse topology file {:?}", path))?;
        tracing::info!("Topo: Loaded {} objects from {:?}", store.objects.len(), path);
        Ok(store)
    }

    /// Objects of `object_type` (any type for `Unspecified`) that satisfy
    /// `filters`, in document order.
    pub fn query<'a>(&'a self, object_type: ObjectType, filters: &Filters) -> Vec<&'a TopoObject> {
        self.objects
            .iter()
            .filter(|obj| object_type == ObjectType::Unspecified || obj.object_type == object_type)
            .filter(|obj| evaluate_filters(filters, &obj.labels, &obj.kind))
            .collect()
    }
}

pub fn header(object_type: ObjectType) -> String {
    match object_type {
        ObjectType::Relation => format!(
            "{:<24} {:<16} {:<24} {:<24} {}",
            "Relation ID", "Kind ID", "Source ID", "Target ID", "Labels"
        ),
        ObjectType::Entity => format!("{:<24} {:<16} {}", "Entity ID", "Kind ID", "Labels"),
        ObjectType::Kind => format!("{:<24} {:<16} {}", "Kind ID", "Name", "Labels"),
        ObjectType::Unspecified => format!(
            "{:<24} {:<10} {:<16} {}",
            "Object ID", "Type", "Kind ID", "Labels"
        ),
    }
}

pub fn format_row(object_type: ObjectType, obj: &TopoObject) -> String {
    let labels = cat_labels(&obj.labels);
    match object_type {
        ObjectType::Relation => format!(
            "{:<24} {:<16} {:<24} {:<24} {}",
            obj.id,
            obj.kind,
            obj.source.as_deref().unwrap_or(""),
            obj.target.as_deref().unwrap_or(""),
            labels
        ),
        ObjectType::Entity | ObjectType::Kind => {
            format!("{:<24} {:<16} {}", obj.id, obj.kind, labels)
        }
        ObjectType::Unspecified => format!(
            "{:<24} {:<10} {:<16} {}",
            obj.id, obj.object_type, obj.kind, labels
        ),
    }
}
