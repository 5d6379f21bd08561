use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Budget-Pal API",
        version = "1.0.0",
        description = "In-memory user resource with hypermedia links.\n\n**Notes:**\n- PUT and PATCH share one merge rule: empty or missing fields keep their current value\n- Ids are integers allocated by the server\n- Nothing survives a restart"
    ),
    paths(
        // Users
        crate::api::users::create_user,
        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::put_user,
        crate::api::users::patch_user,
        crate::api::users::delete_user,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::models::Link,
            crate::models::UserResponse,
            crate::models::UserListResponse,
            crate::models::DeleteResponse,
            crate::models::UpdateUserRequest,
            crate::api::health::HealthResponse,
            crate::api::metrics::CounterSnapshot,
        )
    ),
    tags(
        (name = "Users", description = "Create, read, update and delete users. Every response carries navigation links."),
        (name = "Health", description = "Health check and request counters."),
    )
)]
pub struct ApiDoc;
