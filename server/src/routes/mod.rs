use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};

use crate::error::AppError;

pub mod auth;
pub mod journeys;
pub mod landmarks;
pub mod narration;
pub mod places;
pub mod scan;
pub mod trips;

/// Text fields of a form, sent either urlencoded or as multipart.
pub struct FormFields(pub HashMap<String, String>);

impl FormFields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str).filter(|value| !value.trim().is_empty())
    }
}

impl<S: Send + Sync> FromRequest<S> for FormFields {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req.headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state).await?;
            return Ok(FormFields(fields));
        }

        let mut multipart = Multipart::from_request(req, state).await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;

        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            fields.insert(name, field.text().await?);
        }

        Ok(FormFields(fields))
    }
}

pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Collects every file sent under `field_name`. Other fields are skipped.
pub async fn read_files(multipart: &mut Multipart, field_name: &str) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
        let bytes = field.bytes().await?;

        files.push(UploadedFile { file_name, content_type, bytes });
    }

    Ok(files)
}
