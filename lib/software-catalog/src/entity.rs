use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

// https://backstage.io/docs/features/software-catalog/descriptor-format

pub const API_VERSION: &str = "backstage.io/v1alpha1";

pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(
    AsRefStr, Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, PartialEq, Serialize,
)]
pub enum Kind {
    #[serde(rename = "API")]
    #[strum(serialize = "API")]
    Api,
    Component,
    Domain,
    Group,
    Location,
    #[default]
    Resource,
    System,
    Template,
    User,
}

impl Kind {
    /// The kind as it appears in catalog API paths, e.g. `resource`.
    pub fn path_segment(&self) -> String {
        self.as_ref().to_lowercase()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Link {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Metadata {
    pub namespace: String,
    pub name: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,

    /// Fields such as `labels` or `tags` that are carried through unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EntitySpec {
    pub owner: String,
    pub system: String,

    #[serde(rename = "type")]
    pub entity_type: String,

    /// Free text. Usually the resource's native state, e.g. `ACTIVE` or `available`.
    pub lifecycle: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A catalog entity as accepted by `PUT {catalog}/{namespace}/{kind}/{name}`.
///
/// `namespace`, `kind` and `name` together identify the entity, so writing the
/// same resource twice replaces the existing record rather than creating a new one.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub api_version: String,
    pub kind: Kind,
    pub metadata: Metadata,
    pub spec: EntitySpec,
}

impl Entity {
    pub fn new(metadata: Metadata, spec: EntitySpec) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: Kind::Resource,
            metadata,
            spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// `[namespace, kind, name]` as used to address the entity in the catalog API.
    pub fn path_segments(&self) -> [String; 3] {
        [
            self.metadata.namespace.clone(),
            self.kind.path_segment(),
            self.metadata.name.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use serde_json::json;
    use test_case::test_case;

    use crate::entity::{Entity, EntitySpec, Kind, Link, Metadata};

    fn entity() -> Entity {
        Entity::new(
            Metadata {
                namespace: "default".to_string(),
                name: "aws-111122223333".to_string(),
                title: "111122223333".to_string(),
                description: "Acme".to_string(),
                annotations: BTreeMap::from([(
                    "aws.amazon.com/account-id".to_string(),
                    "111122223333".to_string(),
                )]),
                links: Some(vec![Link {
                    url: "https://serverlessops.awsapps.com".to_string(),
                    title: Some("AWS Console".to_string()),
                    icon: Some("aws".to_string()),
                    link_type: Some("admin-console".to_string()),
                }]),
                ..Default::default()
            },
            EntitySpec {
                owner: "team-payments".to_string(),
                system: "payments".to_string(),
                entity_type: "cloud-account".to_string(),
                lifecycle: "ACTIVE".to_string(),
                ..Default::default()
            },
        )
    }

    #[test_case(Kind::Resource => "resource")]
    #[test_case(Kind::System => "system")]
    #[test_case(Kind::Api => "api")]
    fn kind_path_segment(kind: Kind) -> String {
        kind.path_segment()
    }

    #[test]
    fn kind_from_str() {
        assert_eq!(Kind::Api, Kind::from_str("API").unwrap());
        assert_eq!(Kind::Resource, Kind::from_str("Resource").unwrap());
    }

    #[test]
    fn path_segments() {
        assert_eq!(
            ["default", "resource", "aws-111122223333"],
            entity().path_segments()
        );
    }

    #[test]
    fn serializes_with_catalog_field_names() {
        let value = serde_json::to_value(entity()).unwrap();

        assert_eq!("backstage.io/v1alpha1", value["apiVersion"]);
        assert_eq!("Resource", value["kind"]);
        assert_eq!("cloud-account", value["spec"]["type"]);
        assert_eq!("admin-console", value["metadata"]["links"][0]["type"]);
    }

    #[test]
    fn links_omitted_when_absent() {
        let mut entity = entity();
        entity.metadata.links = None;

        let value = serde_json::to_value(&entity).unwrap();
        assert!(value["metadata"].get("links").is_none());
    }

    #[test]
    fn deserializes_queued_entity() {
        let body = r#"{
            "apiVersion": "backstage.io/v1alpha1",
            "kind": "Resource",
            "metadata": {
                "namespace": "123456789012",
                "name": "ecs-cluster-api",
                "title": "api",
                "annotations": {"io.serverlessops/cloud-provider": "aws"}
            },
            "spec": {"owner": "team-a", "system": "api", "type": "ecs-cluster", "lifecycle": "ACTIVE"}
        }"#;

        let entity: Entity = serde_json::from_str(body).unwrap();
        assert_eq!("ecs-cluster-api", entity.name());
        assert_eq!("123456789012", entity.namespace());
        assert_eq!("", entity.metadata.description);
        assert_eq!(None, entity.metadata.links);
        assert!(entity.metadata.extra.is_empty());
    }

    #[test]
    fn keeps_unmodelled_fields() {
        let body = json!({
            "apiVersion": "backstage.io/v1alpha1",
            "kind": "Resource",
            "metadata": {
                "namespace": "default",
                "name": "x",
                "title": "x",
                "description": "",
                "annotations": {},
                "labels": {"env": "prod"},
                "tags": ["aws"]
            },
            "spec": {
                "owner": "o",
                "system": "s",
                "type": "t",
                "lifecycle": "l",
                "dependsOn": ["resource:y"]
            }
        });

        let entity: Entity = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(json!({"env": "prod"}), entity.metadata.extra["labels"]);
        assert_eq!(json!(["resource:y"]), entity.spec.extra["dependsOn"]);
        assert_eq!(body, serde_json::to_value(&entity).unwrap());
    }

    #[test]
    fn built_entity_has_no_extra_fields() {
        let value = serde_json::to_value(entity()).unwrap();

        let mut metadata: Vec<&str> = value["metadata"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        metadata.sort_unstable();
        assert_eq!(
            vec!["annotations", "description", "links", "name", "namespace", "title"],
            metadata
        );
    }
}
