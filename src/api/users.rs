use actix_web::{web, HttpResponse};
use crate::models::{DeleteResponse, UpdateUserRequest, User, UserListResponse, UserResponse};
use crate::store::UserStore;
use crate::utils::AppError;

/// Path segments must parse as a signed integer. Checked before the store is touched.
fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::InvalidIdentifier(raw.to_string()))
}

/// POST /users/ - Creates an empty user with a freshly allocated id
#[utoipa::path(
    post,
    path = "/users/",
    tag = "Users",
    responses(
        (status = 201, description = "User created", body = UserResponse)
    )
)]
pub async fn create_user(store: web::Data<UserStore>) -> HttpResponse {
    log::info!("📝 POST /users/");

    let id = store.create();
    HttpResponse::Created().json(UserResponse::created(id))
}

/// GET /users/{id}
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id (integer)")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Invalid user ID"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    store: web::Data<UserStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_user_id(&path)?;
    log::info!("🔍 GET /users/{}", id);

    match store.get(id) {
        Some(user) => Ok(HttpResponse::Ok().json(UserResponse::detail(user))),
        None => {
            log::warn!("⚠️ User {} not found", id);
            Err(AppError::NotFound(id))
        }
    }
}

/// GET /users/ - Lists every user, no ordering guaranteed
#[utoipa::path(
    get,
    path = "/users/",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = UserListResponse)
    )
)]
pub async fn list_users(store: web::Data<UserStore>) -> HttpResponse {
    let users = store.list();
    log::info!("📋 GET /users/ - {} users", users.len());

    HttpResponse::Ok().json(UserListResponse::new(users))
}

/// PUT /users/{id} - Full update (empty fields keep their current value)
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id (integer)")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid user ID or invalid JSON"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Failed to update user")
    )
)]
pub async fn put_user(
    store: web::Data<UserStore>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    apply_update(&store, &path, &body, "PUT")
        .map(|user| HttpResponse::Ok().json(UserResponse::detail(user)))
}

/// PATCH /users/{id} - Partial update, same merge rule as PUT
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id (integer)")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid user ID or invalid JSON"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Failed to update user")
    )
)]
pub async fn patch_user(
    store: web::Data<UserStore>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    apply_update(&store, &path, &body, "PATCH")
        .map(|user| HttpResponse::Ok().json(UserResponse::detail(user)))
}

// Order matters: bad id (400), unknown id (404), then bad body (400).
// The lookup, decode and merge share one store lock, so a concurrent delete yields 404, never 500.
fn apply_update(
    store: &UserStore,
    raw_id: &str,
    body: &[u8],
    verb: &str,
) -> Result<User, AppError> {
    let id = parse_user_id(raw_id)?;
    log::info!("🔧 {} /users/{}", verb, id);

    let outcome = store.update_with(id, || {
        decode_update(body)
            .map(UpdateUserRequest::into_fields)
            .map_err(|e| {
                log::warn!("⚠️ Rejecting {} body for user {}: {}", verb, id, e);
                e
            })
    });

    match outcome {
        Some(Ok(user)) => {
            log::info!("✅ User {} updated", id);
            Ok(user)
        }
        Some(Err(e)) => Err(e),
        None => {
            log::warn!("⚠️ User {} not found", id);
            Err(AppError::NotFound(id))
        }
    }
}

/// Reads the first JSON value of the body and ignores anything after it.
/// A `null` body updates nothing; an empty body is malformed.
fn decode_update(body: &[u8]) -> Result<UpdateUserRequest, AppError> {
    let first = serde_json::Deserializer::from_slice(body)
        .into_iter::<Option<UpdateUserRequest>>()
        .next()
        .ok_or_else(|| AppError::MalformedBody("empty body".to_string()))?;

    first
        .map(Option::unwrap_or_default)
        .map_err(|e| AppError::MalformedBody(e.to_string()))
}

/// DELETE /users/{id}
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id (integer)")),
    responses(
        (status = 200, description = "User deleted", body = DeleteResponse),
        (status = 400, description = "Invalid user ID"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    store: web::Data<UserStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_user_id(&path)?;
    log::info!("🗑️  DELETE /users/{}", id);

    if !store.delete(id) {
        log::warn!("⚠️ User {} not found", id);
        return Err(AppError::NotFound(id));
    }

    Ok(HttpResponse::Ok().json(DeleteResponse::confirmed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::configure_routes;
    use crate::store::SequentialIds;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    fn sequential_store() -> web::Data<UserStore> {
        web::Data::new(UserStore::new(Box::new(SequentialIds::default())))
    }

    macro_rules! app {
        ($store:expr) => {
            test::init_service(App::new().app_data($store.clone()).configure(configure_routes)).await
        };
    }

    #[actix_web::test]
    async fn test_parse_user_id() {
        assert_eq!(parse_user_id("42").unwrap(), 42);
        assert_eq!(parse_user_id("-3").unwrap(), -3);
        assert!(parse_user_id("abc").is_err());
        assert!(parse_user_id("1.5").is_err());
        assert!(parse_user_id("99999999999999999999").is_err());
    }

    #[actix_web::test]
    async fn test_full_lifecycle() {
        let store = web::Data::new(UserStore::default());
        let app = app!(store);

        let req = test::TestRequest::post().uri("/users/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["links"].as_array().unwrap().len(), 3);
        assert!(created.get("name").is_none());

        let req = test::TestRequest::get().uri(&format!("/users/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let fetched: Value = test::read_body_json(resp).await;
        assert_eq!(fetched["id"].as_i64(), Some(id));
        assert_eq!(fetched["name"], "");
        assert_eq!(fetched["email"], "");

        let req = test::TestRequest::patch()
            .uri(&format!("/users/{}", id))
            .set_payload(r#"{"name":"Ada"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let patched: Value = test::read_body_json(resp).await;
        assert_eq!(patched["name"], "Ada");
        assert_eq!(patched["email"], "");

        let req = test::TestRequest::delete().uri(&format!("/users/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let deleted: Value = test::read_body_json(resp).await;
        assert_eq!(deleted["message"], "User deleted successfully");

        let req = test::TestRequest::get().uri(&format!("/users/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let err: Value = test::read_body_json(resp).await;
        assert_eq!(err["error"], "User not found");
    }

    #[actix_web::test]
    async fn test_create_links() {
        let store = sequential_store();
        let app = app!(store);

        let req = test::TestRequest::post().uri("/users/").to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            created,
            serde_json::json!({
                "id": 1,
                "links": [
                    {"rel": "self", "href": "/users/1"},
                    {"rel": "delete", "href": "/users/1"},
                    {"rel": "users", "href": "/users/"}
                ]
            })
        );
    }

    #[actix_web::test]
    async fn test_put_merges_fields() {
        let store = sequential_store();
        let id = store.create();
        store.update(id, "A", "b@x");
        let app = app!(store);

        let req = test::TestRequest::put()
            .uri(&format!("/users/{}", id))
            .set_payload(r#"{"name":"","email":"c@y"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["name"], "A");
        assert_eq!(body["email"], "c@y");
        assert_eq!(body["links"][2]["rel"], "users");
    }

    #[actix_web::test]
    async fn test_invalid_id_is_bad_request() {
        let store = sequential_store();
        let app = app!(store);

        for req in [
            test::TestRequest::get().uri("/users/abc").to_request(),
            test::TestRequest::delete().uri("/users/abc").to_request(),
            test::TestRequest::put().uri("/users/abc").set_payload("{}").to_request(),
            test::TestRequest::patch().uri("/users/abc").set_payload("{}").to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let err: Value = test::read_body_json(resp).await;
            assert_eq!(err["error"], "Invalid user ID");
        }
        assert!(store.is_empty());
    }

    #[actix_web::test]
    async fn test_malformed_body() {
        let store = sequential_store();
        let id = store.create();
        let app = app!(store);

        for payload in ["", "{not json", "[1,2]", r#"{"name": 5}"#] {
            let req = test::TestRequest::put()
                .uri(&format!("/users/{}", id))
                .set_payload(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {:?}", payload);
            let err: Value = test::read_body_json(resp).await;
            assert_eq!(err["error"], "Invalid JSON");
        }
    }

    #[actix_web::test]
    async fn test_unknown_id_checked_before_body() {
        let store = sequential_store();
        let app = app!(store);

        let req = test::TestRequest::patch()
            .uri("/users/77")
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_delete_never_created() {
        let store = sequential_store();
        let app = app!(store);

        let req = test::TestRequest::delete().uri("/users/5").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_list_users() {
        let store = sequential_store();
        let first = store.create();
        let second = store.create();
        store.update(second, "Grace", "grace@example.com");
        let app = app!(store);

        let req = test::TestRequest::get().uri("/users/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;

        let mut ids: Vec<i64> = body["users"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["id"].as_i64().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![first, second]);

        let grace = body["users"]
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["id"].as_i64() == Some(second))
            .unwrap();
        assert_eq!(grace["name"], "Grace");
        assert_eq!(grace["links"][1]["rel"], "update");
        assert_eq!(body["links"][1]["rel"], "create");
    }

    #[actix_web::test]
    async fn test_list_empty() {
        let store = sequential_store();
        let app = app!(store);

        let req = test::TestRequest::get().uri("/users/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["users"], serde_json::json!([]));
    }

    #[actix_web::test]
    async fn test_concurrent_creates_over_http() {
        let store = web::Data::new(UserStore::default());
        let app = app!(store);

        let requests = (0..50).map(|_| {
            test::call_service(&app, test::TestRequest::post().uri("/users/").to_request())
        });
        let responses = futures::future::join_all(requests).await;
        assert!(responses.iter().all(|r| r.status() == StatusCode::CREATED));
        assert_eq!(store.len(), 50);
    }

    #[actix_web::test]
    async fn test_null_body_keeps_record() {
        let store = sequential_store();
        let id = store.create();
        store.update(id, "A", "b@x");
        let app = app!(store);

        let req = test::TestRequest::put()
            .uri(&format!("/users/{}", id))
            .set_payload("null")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["name"], "A");
        assert_eq!(body["email"], "b@x");
    }

    #[actix_web::test]
    async fn test_trailing_data_after_body_is_ignored() {
        let store = sequential_store();
        let id = store.create();
        let app = app!(store);

        let req = test::TestRequest::patch()
            .uri(&format!("/users/{}", id))
            .set_payload(r#"{"name":"A"} x"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["name"], "A");
    }

    #[actix_web::test]
    async fn test_update_racing_delete_never_fails_internally() {
        struct AlwaysOne;
        impl crate::store::IdGenerator for AlwaysOne {
            fn next_id(&mut self) -> i64 {
                1
            }
        }

        let store = UserStore::new(Box::new(AlwaysOne));
        store.create();

        let (updated, missing) = std::thread::scope(|s| {
            let churn = s.spawn(|| {
                for _ in 0..20_000 {
                    store.delete(1);
                    store.create();
                }
            });

            let mut updated = 0;
            let mut missing = 0;
            for _ in 0..20_000 {
                match apply_update(&store, "1", br#"{"name":"x"}"#, "PUT") {
                    Ok(user) => {
                        // The snapshot is this request's merge, never a fresh record.
                        assert_eq!(user.name, "x");
                        updated += 1;
                    }
                    Err(AppError::NotFound(1)) => missing += 1,
                    Err(e) => panic!("unexpected update error: {}", e),
                }
            }
            churn.join().unwrap();
            (updated, missing)
        });

        assert_eq!(updated + missing, 20_000);
    }
}
