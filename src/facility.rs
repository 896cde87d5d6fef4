//! Facility selection by tag.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info};

use crate::graph::{EntityId, Graph};

/// Which entities count as facilities and how they are labelled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FacilityQuery {
    /// Tag key naming the category, e.g. `amenity`.
    pub key: String,
    /// Required value of `key`, e.g. `hospital`.
    pub value: String,
    /// Tag holding the display label.
    pub name_key: String,
    /// Label used when `name_key` is missing.
    pub placeholder: String,
}

impl Default for FacilityQuery {
    fn default() -> Self {
        Self {
            key: "amenity".to_string(),
            value: "hospital".to_string(),
            name_key: "name".to_string(),
            placeholder: "Unnamed Hospital".to_string(),
        }
    }
}

/// Selected facilities in graph order, with their labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilitySet {
    ids: Vec<EntityId>,
    labels: HashMap<EntityId, String>,
}

impl FacilitySet {
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.labels.contains_key(id)
    }

    pub fn label(&self, id: &EntityId) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// `(id, label)` pairs in selection order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &str)> {
        self.ids
            .iter()
            .map(|id| (id, self.labels.get(id).map_or("", String::as_str)))
    }

    /// First facility carrying `label`. Labels are not unique.
    pub fn find_by_label(&self, label: &str) -> Option<&EntityId> {
        self.iter().find(|(_, l)| *l == label).map(|(id, _)| id)
    }

    fn push(&mut self, id: EntityId, label: String) {
        self.labels.insert(id.clone(), label);
        self.ids.push(id);
    }
}

/// Picks every entity whose `query.key` tag equals `query.value` exactly.
pub fn select_facilities(graph: &Graph, query: &FacilityQuery) -> FacilitySet {
    let mut set = FacilitySet::default();
    for entity in graph.iter() {
        if entity.tag(&query.key) != Some(query.value.as_str()) {
            continue;
        }
        let label = entity
            .tag(&query.name_key)
            .unwrap_or(query.placeholder.as_str())
            .to_string();
        debug!(id = %entity.id, %label, "facility identified");
        set.push(entity.id.clone(), label);
    }
    info!(facilities = set.len(), key = %query.key, value = %query.value, "facilities selected");
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Entity;

    fn add(graph: &mut Graph, id: &str, tags: &[(&str, &str)]) {
        let tags = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        graph.upsert(Entity::new(EntityId::node(id), tags));
    }

    fn sample() -> Graph {
        let mut graph = Graph::new();
        add(&mut graph, "3", &[("amenity", "hospital"), ("name", "St. Mary")]);
        add(&mut graph, "1", &[("amenity", "school"), ("name", "Elm School")]);
        add(&mut graph, "2", &[("amenity", "hospital")]);
        add(&mut graph, "4", &[("amenity", "Hospital")]);
        add(&mut graph, "5", &[("healthcare", "hospital")]);
        graph
    }

    #[test]
    fn test_selects_exact_matches_in_graph_order() {
        let set = select_facilities(&sample(), &FacilityQuery::default());
        assert_eq!(set.ids(), &[EntityId::node("3"), EntityId::node("2")]);
    }

    #[test]
    fn test_labels_fall_back_to_placeholder() {
        let set = select_facilities(&sample(), &FacilityQuery::default());
        assert_eq!(set.label(&EntityId::node("3")), Some("St. Mary"));
        assert_eq!(set.label(&EntityId::node("2")), Some("Unnamed Hospital"));
        assert_eq!(set.label(&EntityId::node("1")), None);
    }

    #[test]
    fn test_find_by_label() {
        let set = select_facilities(&sample(), &FacilityQuery::default());
        assert_eq!(set.find_by_label("St. Mary"), Some(&EntityId::node("3")));
        assert_eq!(set.find_by_label("Elm School"), None);
    }

    #[test]
    fn test_custom_query() {
        let query = FacilityQuery {
            key: "amenity".to_string(),
            value: "school".to_string(),
            ..FacilityQuery::default()
        };
        let set = select_facilities(&sample(), &query);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&EntityId::node("1")));
    }
}
