//! Product categories.

use crate::error::CommerceError;
use crate::ids::CategoryId;
use serde::{Deserialize, Serialize};

/// A product category. Categories form a tree through `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub status: bool,
}

fn default_true() -> bool {
    true
}

impl Category {
    /// Whether this is a top-level category.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Create/update body for `/categories`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    /// Required on create, ignored on update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub status: bool,
}

impl CategoryPayload {
    pub fn validate(&self) -> Result<(), CommerceError> {
        let invalid = |msg: &str| Err(CommerceError::ValidationError(msg.to_string()));
        if self.name.trim().is_empty() {
            return invalid("category name is required");
        }
        if self.name.chars().count() > 255 {
            return invalid("category name exceeds 255 characters");
        }
        if self.id.is_some() && self.id == self.parent_id {
            return invalid("a category cannot be its own parent");
        }
        Ok(())
    }
}

impl From<&Category> for CategoryPayload {
    fn from(c: &Category) -> Self {
        Self {
            id: None,
            name: c.name.clone(),
            description: c.description.clone(),
            parent_id: c.parent_id.clone(),
            image_url: c.image_url.clone(),
            status: c.status,
        }
    }
}
