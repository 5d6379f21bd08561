use serde::Serialize;

use super::User;

pub const USERS_COLLECTION: &str = "/users/";

#[derive(Debug, Serialize, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    pub fn new(rel: &str, href: impl Into<String>) -> Self {
        Self {
            rel: rel.to_string(),
            href: href.into(),
        }
    }
}

pub fn user_href(id: i64) -> String {
    format!("/users/{}", id)
}

/// Single-resource envelope. `name`/`email` are skipped only on the create response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub links: Vec<Link>,
}

impl UserResponse {
    /// Links: self, delete, users.
    fn item_links(id: i64) -> Vec<Link> {
        vec![
            Link::new("self", user_href(id)),
            Link::new("delete", user_href(id)),
            Link::new("users", USERS_COLLECTION),
        ]
    }

    pub fn created(id: i64) -> Self {
        Self {
            id,
            name: None,
            email: None,
            links: Self::item_links(id),
        }
    }

    pub fn detail(user: User) -> Self {
        Self {
            id: user.id,
            links: Self::item_links(user.id),
            name: Some(user.name),
            email: Some(user.email),
        }
    }

    pub fn list_item(user: User) -> Self {
        let href = user_href(user.id);
        Self {
            id: user.id,
            name: Some(user.name),
            email: Some(user.email),
            links: vec![
                Link::new("self", href.clone()),
                Link::new("update", href.clone()),
                Link::new("delete", href),
            ],
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub links: Vec<Link>,
}

impl UserListResponse {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: users.into_iter().map(UserResponse::list_item).collect(),
            links: vec![
                Link::new("self", USERS_COLLECTION),
                Link::new("create", USERS_COLLECTION),
            ],
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    pub message: String,
    pub links: Vec<Link>,
}

impl DeleteResponse {
    pub fn confirmed() -> Self {
        Self {
            message: "User deleted successfully".to_string(),
            links: vec![
                Link::new("users", USERS_COLLECTION),
                Link::new("create", USERS_COLLECTION),
            ],
        }
    }
}
