//! Normalized response cache.
//!
//! Objects carrying both `__typename` and `id` are entities. They are stored once in
//! an entity table and merged field by field as newer responses arrive, so an update
//! seen through one query is visible through every other query that references the
//! same entity. Query results are kept with entities replaced by references and are
//! rebuilt from the table on read.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

const TYPENAME: &str = "__typename";
const REF: &str = "__ref";

/// Nested entities deeper than this are returned as bare references.
const MAX_DEPTH: usize = 16;

/// Counters the server derives per entity. A counter that has not been returned yet
/// reads as zero instead of being missing.
const DERIVED_COUNTERS: &[(&str, &[&str])] = &[
    ("OrganizationType", &["projectCount", "taskCount"]),
    (
        "ProjectType",
        &["taskCount", "completedTasks", "completionRate"],
    ),
    ("TaskType", &["commentCount"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    typename: String,
    id: String,
}

impl EntityKey {
    pub fn new(typename: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            typename: typename.into(),
            id: id.into(),
        }
    }

    fn of(object: &Map<String, Value>) -> Option<Self> {
        let typename = object.get(TYPENAME)?.as_str()?;
        let id = match object.get("id")? {
            Value::String(id) => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return None,
        };
        Some(Self::new(typename, id))
    }

    fn parse(reference: &str) -> Option<Self> {
        let (typename, id) = reference.split_once(':')?;
        Some(Self::new(typename, id))
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.typename, self.id)
    }
}

/// Identifies one stored query result: operation, organization scope and variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    operation: &'static str,
    scope: Option<String>,
    variables: String,
}

impl QueryKey {
    pub fn new(operation: &'static str, scope: Option<&str>, variables: &Value) -> Self {
        Self {
            operation,
            scope: scope.map(str::to_string),
            // serde_json maps are ordered by key, so equal variables print identically.
            variables: variables.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Cache {
    entities: HashMap<EntityKey, Map<String, Value>>,
    queries: HashMap<QueryKey, Value>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` as the result of `key`, merging its entities into the table.
    pub fn write_query(&mut self, key: QueryKey, data: &Value) {
        let normalized = self.normalize(data);
        self.queries.insert(key, normalized);
    }

    /// Merges the entities found in `data` without recording a query result.
    pub fn merge(&mut self, data: &Value) {
        self.normalize(data);
    }

    /// Rebuilds a stored query result from the entity table.
    pub fn read_query(&self, key: &QueryKey) -> Option<Value> {
        self.queries.get(key).map(|value| self.resolve(value, 0))
    }

    /// The current merged state of one entity.
    pub fn entity(&self, key: &EntityKey) -> Option<Value> {
        self.entities
            .get(key)
            .map(|fields| self.resolve_entity(key, fields, 0))
    }

    /// Drops an entity. Lists that referenced it stop returning it.
    pub fn evict(&mut self, key: &EntityKey) -> bool {
        self.entities.remove(key).is_some()
    }

    pub fn reset(&mut self) {
        self.entities.clear();
        self.queries.clear();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    fn normalize(&mut self, value: &Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(items.iter().map(|v| self.normalize(v)).collect()),
            Value::Object(object) => {
                let mut fields = Map::new();
                for (name, field) in object {
                    fields.insert(name.clone(), self.normalize(field));
                }
                match EntityKey::of(object) {
                    Some(key) => {
                        let reference = reference_to(&key);
                        self.entities.entry(key).or_default().extend(fields);
                        reference
                    }
                    None => Value::Object(fields),
                }
            }
            other => other.clone(),
        }
    }

    fn resolve(&self, value: &Value, depth: usize) -> Value {
        match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve(item, depth))
                    // references to evicted entities drop out of lists
                    .filter(|item| !item.is_null())
                    .collect(),
            ),
            Value::Object(object) => match reference_key(object) {
                Some(key) => match self.entities.get(&key) {
                    Some(_) if depth >= MAX_DEPTH => value.clone(),
                    Some(fields) => self.resolve_entity(&key, fields, depth + 1),
                    None => Value::Null,
                },
                None => Value::Object(
                    object
                        .iter()
                        .map(|(name, field)| (name.clone(), self.resolve(field, depth)))
                        .collect(),
                ),
            },
            other => other.clone(),
        }
    }

    fn resolve_entity(&self, key: &EntityKey, fields: &Map<String, Value>, depth: usize) -> Value {
        let mut resolved: Map<String, Value> = fields
            .iter()
            .map(|(name, field)| (name.clone(), self.resolve(field, depth)))
            .collect();
        if let Some((_, counters)) = DERIVED_COUNTERS
            .iter()
            .find(|(typename, _)| *typename == key.typename)
        {
            for counter in counters.iter() {
                let slot = resolved.entry(counter.to_string()).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = Value::from(0);
                }
            }
        }
        Value::Object(resolved)
    }
}

fn reference_to(key: &EntityKey) -> Value {
    let mut reference = Map::new();
    reference.insert(REF.to_string(), Value::String(key.to_string()));
    Value::Object(reference)
}

fn reference_key(object: &Map<String, Value>) -> Option<EntityKey> {
    if object.len() != 1 {
        return None;
    }
    EntityKey::parse(object.get(REF)?.as_str()?)
}
