use super::{ApiResult, AppState, AuthUser, JsonBody, OkResponse};
use crate::users::{LoginInput, RegisterInput, Session, UpdateProfileInput, UserView};
use axum::extract::{Path, State};
use axum::Json;

pub(crate) async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> ApiResult<Session> {
    let session = state.users.register(input)?;
    Ok(Json(session))
}

pub(crate) async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> ApiResult<Session> {
    let session = state.users.login(input)?;
    Ok(Json(session))
}

pub(crate) async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserView> {
    Ok(Json(state.users.get_profile(&id)?))
}

pub(crate) async fn update_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateProfileInput>,
) -> ApiResult<UserView> {
    if caller != id {
        tracing::warn!(caller = %caller, target = %id, "profile updated by another user");
    }
    Ok(Json(state.users.update_profile(&id, input)?))
}

pub(crate) async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserView>> {
    Ok(Json(state.users.list_users()?))
}

pub(crate) async fn follow_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(target): Path<String>,
) -> ApiResult<OkResponse> {
    state.follows.follow(&target, &caller)?;
    Ok(Json(OkResponse::ok()))
}
