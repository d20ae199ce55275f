/// Post handlers - create, view, edit and delete posts, plus likes and comments
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PostId;
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{FeedService, NewPost};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub city: String,
    /// Free text; `#`-prefixed words become tags
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub caption: String,
    pub image_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub city: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

/// Identifies the caller's own comment by its exact text and timestamp
#[derive(Debug, Deserialize)]
pub struct RemoveCommentRequest {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub id: PostId,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub post_id: PostId,
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

pub async fn create_post(
    service: web::Data<FeedService>,
    user: CurrentUser,
    req: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner();
    let id = service
        .create_post(NewPost {
            author_id: user.0,
            city: req.city,
            raw_tags: req.tags,
            caption: req.caption,
            image_ref: req.image_ref,
        })
        .await?;

    Ok(HttpResponse::Created().json(CreatePostResponse { id }))
}

pub async fn get_post(
    service: web::Data<FeedService>,
    post_id: web::Path<PostId>,
    viewer: Option<CurrentUser>,
) -> AppResult<HttpResponse> {
    let detail = service
        .get_post(*post_id, viewer.as_ref().map(CurrentUser::as_str))
        .await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn update_post(
    service: web::Data<FeedService>,
    post_id: web::Path<PostId>,
    user: CurrentUser,
    req: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner();
    service
        .edit_post(*post_id, user.as_str(), &req.city, &req.tags, req.caption)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_post(
    service: web::Data<FeedService>,
    post_id: web::Path<PostId>,
    user: CurrentUser,
) -> AppResult<HttpResponse> {
    let removed = service.delete_post(*post_id, user.as_str()).await?;
    Ok(HttpResponse::Ok().json(RemovedResponse { removed }))
}

pub async fn like_post(
    service: web::Data<FeedService>,
    post_id: web::Path<PostId>,
    user: CurrentUser,
) -> AppResult<HttpResponse> {
    set_like(&service, *post_id, &user, true).await
}

pub async fn unlike_post(
    service: web::Data<FeedService>,
    post_id: web::Path<PostId>,
    user: CurrentUser,
) -> AppResult<HttpResponse> {
    set_like(&service, *post_id, &user, false).await
}

async fn set_like(
    service: &FeedService,
    post_id: PostId,
    user: &CurrentUser,
    liked: bool,
) -> AppResult<HttpResponse> {
    let like_count = service.toggle_like(post_id, user.as_str(), liked).await?;
    Ok(HttpResponse::Ok().json(LikeResponse {
        post_id,
        liked,
        like_count,
    }))
}

pub async fn add_comment(
    service: web::Data<FeedService>,
    post_id: web::Path<PostId>,
    user: CurrentUser,
    req: web::Json<AddCommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = service
        .add_comment(*post_id, user.as_str(), &req.text)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn remove_comment(
    service: web::Data<FeedService>,
    post_id: web::Path<PostId>,
    user: CurrentUser,
    req: web::Json<RemoveCommentRequest>,
) -> AppResult<HttpResponse> {
    let removed = service
        .remove_comment(*post_id, user.as_str(), &req.text, req.created_at)
        .await?;
    Ok(HttpResponse::Ok().json(RemovedResponse { removed }))
}
