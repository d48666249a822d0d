use dex_proto::shield_v1beta1::Project;

use crate::structpb;

/// Project details resolved from the identity service for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectContext {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ProjectContext {
    pub fn from_proto(project: Project) -> Self {
        // Metadata is advisory; a value that does not decode is dropped
        // rather than failing the request.
        let metadata = project
            .metadata
            .as_ref()
            .and_then(|m| structpb::from_struct_fields(m).ok())
            .unwrap_or_default();

        Self {
            id: project.id,
            slug: project.slug,
            name: project.name,
            metadata,
        }
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Owning team: the `team` metadata entry, falling back to the slug.
    pub fn team(&self) -> &str {
        self.metadata_str("team").unwrap_or(&self.slug)
    }

    /// Cluster used when a firehose does not name one.
    pub fn default_cluster(&self) -> Option<&str> {
        self.metadata_str("cluster")
    }
}
