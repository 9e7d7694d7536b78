use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use crate::domain::uploads::ImageUpload;

use crate::infra::http::error::{ApiError, codes};

/// Buffered multipart form: text fields and file parts, in submission order.
#[derive(Debug, Default)]
pub struct MultipartForm {
    values: Vec<(String, String)>,
    files: Vec<(String, ImageUpload)>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_to_api)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field
                        .content_type()
                        .map(str::to_string)
                        .unwrap_or_else(|| {
                            mime_guess::from_path(&filename)
                                .first_or_octet_stream()
                                .to_string()
                        });
                    let data = field.bytes().await.map_err(multipart_to_api)?;
                    // Browsers submit an empty part for an untouched file input.
                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.push((
                        name,
                        ImageUpload {
                            filename,
                            content_type,
                            data,
                        },
                    ));
                }
                None => {
                    let value = field.text().await.map_err(multipart_to_api)?;
                    form.values.push((name, value));
                }
            }
        }

        Ok(form)
    }

    /// First value of a text field.
    pub fn text<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.texts(name).next()
    }

    pub fn texts<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .iter()
            .filter(move |(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text field that is required to reach the service; a missing field is
    /// passed on as blank so the service reports which field is missing.
    pub fn text_or_blank(&self, name: &str) -> String {
        self.text(name).unwrap_or_default().to_string()
    }

    /// Text field with surrounding whitespace removed, `None` when blank.
    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.text(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn take_file(&mut self, name: &str) -> Option<ImageUpload> {
        let index = self.files.iter().position(|(field, _)| field == name)?;
        Some(self.files.remove(index).1)
    }

    pub fn take_files(&mut self, name: &str) -> Vec<ImageUpload> {
        let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = rest;
        matching.into_iter().map(|(_, file)| file).collect()
    }
}

fn multipart_to_api(err: MultipartError) -> ApiError {
    let status = err.status();
    let api = if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            status,
            codes::PAYLOAD_TOO_LARGE,
            "Request body is too large",
            None,
        )
    } else {
        ApiError::bad_request("Invalid multipart payload", Some(err.body_text()))
    };
    api.with_source("infra::http::admin::multipart")
        .with_detail(err)
}
