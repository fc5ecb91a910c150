use super::{ApiError, ApiResult, AppState, AuthUser};
use crate::content::{ContentListing, ContentView, UploadContentInput};
use crate::files::UploadedFile;
use axum::extract::{Multipart, Path, State};
use axum::Json;

pub(crate) async fn list_content(State(state): State<AppState>) -> ApiResult<Vec<ContentListing>> {
    Ok(Json(state.content.list_content()?))
}

pub(crate) async fn upload_content(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<ContentView> {
    let mut input = UploadContentInput::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "files" | "files[]" | "cover" | "screenshots" | "screenshots[]" => {
                let original_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?.to_vec();
                let upload = UploadedFile {
                    original_name,
                    data,
                };
                match name.as_str() {
                    "cover" => {
                        if input.cover.is_none() {
                            input.cover = Some(upload);
                        }
                    }
                    "screenshots" | "screenshots[]" => input.screenshots.push(upload),
                    _ => input.files.push(upload),
                }
            }
            "title" => input.title = Some(field.text().await?),
            "description" => input.description = Some(field.text().await?),
            "tags" => input.tags = Some(field.text().await?),
            "price" => input.price = Some(field.text().await?),
            "authorId" => input.author_id = Some(field.text().await?),
            "type" => input.content_type = Some(field.text().await?),
            other => {
                tracing::debug!(field = %other, "ignoring unknown upload field");
            }
        }
    }

    if input.author_id.as_deref() != Some(caller.as_str()) {
        tracing::debug!(caller = %caller, author_id = ?input.author_id, "upload author differs from caller");
    }

    let view = state.content.upload_content(input).await?;
    Ok(Json(view))
}

pub(crate) async fn like_content(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ContentView> {
    state
        .content
        .like_content(&id, &caller)
        .map(Json)
        .map_err(ApiError::from)
}
