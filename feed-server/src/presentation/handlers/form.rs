use axum::extract::Multipart;
use axum::extract::multipart::Field;
use serde_json::Value;

use crate::domain::post::MediaUpload;
use crate::presentation::app_error::{AppError, AppResult};

/// Fields of a post create/update form. Unknown fields are ignored.
#[derive(Debug, Default)]
pub(crate) struct PostForm {
    pub(crate) post_type: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) metadata: Option<Value>,
    pub(crate) media: Option<MediaUpload>,
}

pub(crate) async fn read_post_form(mut multipart: Multipart) -> AppResult<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("multipart error: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "post_type" => form.post_type = Some(text(field).await?),
            "title" => form.title = Some(text(field).await?),
            "content" => form.content = Some(text(field).await?),
            "metadata" => form.metadata = Some(Value::String(text(field).await?)),
            "media" => form.media = media(field).await?,
            _ => {}
        }
    }

    Ok(form)
}

async fn text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|err| AppError::BadRequest(format!("failed to read form field: {err}")))
}

/// An empty file input (no name, no bytes) counts as no media.
async fn media(field: Field<'_>) -> AppResult<Option<MediaUpload>> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);
    let data = field
        .bytes()
        .await
        .map_err(|err| AppError::BadRequest(format!("failed to read media: {err}")))?;

    if file_name.is_empty() && data.is_empty() {
        return Ok(None);
    }

    Ok(Some(MediaUpload {
        file_name,
        content_type,
        data: data.to_vec(),
    }))
}
