/// Profile views: a user's own posts and the posts they liked
use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::services::FeedService;

pub async fn get_user_posts(
    service: web::Data<FeedService>,
    user_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let posts = service.posts_by_author(&user_id).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_user_likes(
    service: web::Data<FeedService>,
    user_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let posts = service.liked_posts(&user_id).await?;
    Ok(HttpResponse::Ok().json(posts))
}
