use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub id: i64,  // PRIMARY IDENTIFIER - immutable once allocated
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// Body accepted by PUT and PATCH. Missing or `null` fields leave the stored value alone.
#[derive(Debug, Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UpdateUserRequest {
    /// Store convention: empty string means "keep current".
    pub fn into_fields(self) -> (String, String) {
        (self.name.unwrap_or_default(), self.email.unwrap_or_default())
    }
}
