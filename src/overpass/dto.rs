//! Transport types for Overpass JSON responses.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    /// Absent when Overpass answered with something other than a result set
    pub elements: Option<Vec<Element>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        tags: Option<HashMap<String, String>>,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        tags: Option<HashMap<String, String>>,
    },
    Relation {
        id: i64,
        #[serde(default)]
        members: Vec<Member>,
        tags: Option<HashMap<String, String>>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub member_type: String,
    #[serde(rename = "ref")]
    pub reference: i64,
}

impl Element {
    pub fn tags(&self) -> Option<&HashMap<String, String>> {
        match self {
            Element::Node { tags, .. } | Element::Way { tags, .. } | Element::Relation { tags, .. } => {
                tags.as_ref()
            }
            Element::Other => None,
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Element::Node { id, .. } | Element::Way { id, .. } | Element::Relation { id, .. } => {
                Some(*id)
            }
            Element::Other => None,
        }
    }

    /// Node ids making up this element's geometry, in order
    pub fn node_refs(&self) -> Vec<i64> {
        match self {
            Element::Node { id, .. } => vec![*id],
            Element::Way { nodes, .. } => nodes.clone(),
            Element::Relation { members, .. } => members
                .iter()
                .filter(|m| m.member_type == "node")
                .map(|m| m.reference)
                .collect(),
            Element::Other => Vec::new(),
        }
    }

    pub fn is_way_or_relation(&self) -> bool {
        matches!(self, Element::Way { .. } | Element::Relation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_elements() {
        let raw = r#"{
            "version": 0.6,
            "elements": [
                { "type": "node", "id": 1, "lat": 45.1, "lon": 6.1 },
                { "type": "way", "id": 10, "nodes": [1, 2], "tags": { "name": "Bellecôte" } },
                { "type": "relation", "id": 20, "members": [
                    { "type": "node", "ref": 1, "role": "" },
                    { "type": "way", "ref": 10, "role": "" }
                ] },
                { "type": "area", "id": 3600000001 }
            ]
        }"#;
        let response: OverpassResponse = serde_json::from_str(raw).unwrap();
        let elements = response.elements.unwrap();
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[1].node_refs(), vec![1, 2]);
        assert_eq!(elements[2].node_refs(), vec![1]);
        assert!(matches!(elements[3], Element::Other));
        assert_eq!(elements[1].tags().unwrap()["name"], "Bellecôte");
    }

    #[test]
    fn test_missing_elements() {
        let response: OverpassResponse = serde_json::from_str(r#"{"remark": "timeout"}"#).unwrap();
        assert!(response.elements.is_none());
    }
}
