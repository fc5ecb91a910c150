use super::{ApiResult, AppState, AuthUser, JsonBody};
use crate::posts::{CreatePostInput, PostListing, PostView};
use axum::extract::State;
use axum::Json;

pub(crate) async fn create_post(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    JsonBody(input): JsonBody<CreatePostInput>,
) -> ApiResult<PostView> {
    Ok(Json(state.posts.create_post(&caller, input)?))
}

pub(crate) async fn list_posts(State(state): State<AppState>) -> ApiResult<Vec<PostListing>> {
    Ok(Json(state.posts.list_posts()?))
}
