// src/utils/multipart.rs

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::{error::AppError, models::money::Money};

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A fully buffered multipart form: text fields and file parts by name.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Drains a multipart body. File parts without content are ignored so
    /// that an empty file input behaves like an absent one.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_owned);
                    let bytes = field.bytes().await?;
                    if bytes.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// A text field, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }

    /// A text field that must be present.
    pub fn required_text(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(format!("Field '{}' is required", name)))
    }

    /// A non-negative money amount.
    pub fn money(&self, name: &str) -> Result<Option<Money>, AppError> {
        let Some(raw) = self.text(name) else {
            return Ok(None);
        };
        let amount: Money = raw.parse()?;
        if amount.is_negative() {
            return Err(AppError::BadRequest(format!(
                "Field '{}' must not be negative",
                name
            )));
        }
        Ok(Some(amount))
    }

    /// Topics given as a JSON array string or a comma separated list.
    pub fn topics(&self, name: &str) -> Result<Option<Vec<String>>, AppError> {
        let Some(raw) = self.text(name) else {
            return Ok(None);
        };
        Ok(Some(parse_topics(&raw)?))
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

fn parse_topics(raw: &str) -> Result<Vec<String>, AppError> {
    let items: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw)?
    } else {
        raw.split(',').map(str::to_owned).collect()
    };

    Ok(items
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}
