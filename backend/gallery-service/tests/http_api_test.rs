//! HTTP surface tests with an in-memory store.

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use gallery_service::domain::CityUniverse;
use gallery_service::handlers;
use gallery_service::middleware::USER_ID_HEADER;
use gallery_service::repository::MemoryStore;
use gallery_service::services::{FeedService, DEFAULT_FACET_SIZE};

fn service() -> web::Data<FeedService> {
    web::Data::new(FeedService::with_store(
        Arc::new(MemoryStore::new()),
        CityUniverse::known(),
        DEFAULT_FACET_SIZE,
    ))
}

macro_rules! app {
    ($data:expr) => {
        test::init_service(
            App::new()
                .app_data($data.clone())
                .configure(handlers::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health() {
    let data = service();
    let app = app!(data);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_create_like_and_read_feed() {
    let data = service();
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header((USER_ID_HEADER, "alice"))
        .set_json(json!({
            "city": "Paris",
            "tags": "#City #red",
            "caption": "rainy day",
            "image_ref": "uploads/1.jpeg"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["id"].as_i64().unwrap();
    assert_eq!(id, 1);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{}/like", id))
        .insert_header((USER_ID_HEADER, "bob"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["like_count"], 1);
    assert_eq!(body["liked"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed?search=paris,%23red&sort=newest")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["city"], "paris");
    assert_eq!(body["posts"][0]["tags"], json!(["city", "red"]));
    assert_eq!(body["cities"][0], json!({"name": "Paris", "count": 1}));
    assert_eq!(body["tags"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{}", id))
        .insert_header((USER_ID_HEADER, "bob"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["like_count"], 1);
    assert_eq!(body["viewer_has_liked"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/users/bob/likes")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["id"], id);
}

#[actix_web::test]
async fn test_search_miss_reports_kind() {
    let data = service();
    let app = app!(data);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed?search=%23cottagecore")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "tag");
    assert_eq!(body["value"], "cottagecore");
    assert_eq!(body["status"], 404);
}

#[actix_web::test]
async fn test_bad_sort_is_rejected() {
    let data = service();
    let app = app!(data);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed?sort=oldest")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_writes_require_user_header() {
    let data = service();
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .set_json(json!({"city": "Paris", "image_ref": "x.jpeg"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_only_author_may_delete() {
    let data = service();
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header((USER_ID_HEADER, "alice"))
        .set_json(json!({"city": "Rome", "image_ref": "x.jpeg"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["id"].as_i64().unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{}", id))
        .insert_header((USER_ID_HEADER, "mallory"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{}", id))
        .insert_header((USER_ID_HEADER, "alice"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["removed"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_comment_round_trip() {
    let data = service();
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header((USER_ID_HEADER, "alice"))
        .set_json(json!({"city": "Tokyo", "image_ref": "x.jpeg"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/posts/{}/comments", id))
        .insert_header((USER_ID_HEADER, "bob"))
        .set_json(json!({"text": "I love this city!!"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: Value = test::read_body_json(resp).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{}/comments", id))
        .insert_header((USER_ID_HEADER, "bob"))
        .set_json(json!({
            "text": comment["text"],
            "created_at": comment["created_at"]
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["removed"], true);
}

#[actix_web::test]
async fn test_city_choices_and_author_posts() {
    let data = service();
    let app = app!(data);

    for (user, city) in [("alice", "Rome"), ("bob", "Paris"), ("alice", "Paris")] {
        let req = test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header((USER_ID_HEADER, user))
            .set_json(json!({"city": city, "image_ref": "x.jpeg"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let req = test::TestRequest::get().uri("/api/v1/cities").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let cities: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert_eq!(cities[..4], ["Paris", "Rome", "Wellesley", "Boston"]);
    assert_eq!(cities.iter().filter(|c| **c == "Rome").count(), 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/users/alice/posts")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 1]);
}
