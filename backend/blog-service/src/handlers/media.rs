/// Uploaded media files
use crate::error::{AppError, Result};
use crate::media::content_type_for;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn serve_media(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let relative = path.into_inner();
    let file = state
        .media
        .resolve(&relative)
        .ok_or_else(|| AppError::not_found(format!("media {}", relative)))?;

    match tokio::fs::metadata(&file).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(AppError::not_found(format!("media {}", relative))),
    }
    let bytes = tokio::fs::read(&file).await?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&file))
        .body(bytes))
}
