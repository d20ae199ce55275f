/// HTTP handlers for gallery-service
///
/// - Feed: filtered, ranked feed with city and tag facets
/// - Posts: create, view, edit, delete, like and comment
/// - Users: profile post lists
pub mod feed;
pub mod posts;
pub mod users;

use actix_web::{web, HttpResponse};

pub use feed::{get_city_choices, get_feed};
pub use posts::{
    add_comment, create_post, delete_post, get_post, like_post, remove_comment, unlike_post,
    update_post,
};
pub use users::{get_user_likes, get_user_posts};

/// Register the `/api/v1` routes and the health check
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api/v1")
            .route("/feed", web::get().to(get_feed))
            .route("/cities", web::get().to(get_city_choices))
            .route("/posts", web::post().to(create_post))
            .service(
                web::resource("/posts/{id}")
                    .route(web::get().to(get_post))
                    .route(web::put().to(update_post))
                    .route(web::delete().to(delete_post)),
            )
            .service(
                web::resource("/posts/{id}/like")
                    .route(web::put().to(like_post))
                    .route(web::delete().to(unlike_post)),
            )
            .service(
                web::resource("/posts/{id}/comments")
                    .route(web::post().to(add_comment))
                    .route(web::delete().to(remove_comment)),
            )
            .route("/users/{id}/posts", web::get().to(get_user_posts))
            .route("/users/{id}/likes", web::get().to(get_user_likes)),
    );
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "gallery-service",
    }))
}
