//! Decoding of multipart event submissions.
//!
//! Decoding happens in two steps. [`EventForm::from_multipart`] collects the
//! raw parts, then [`EventForm::into_new_event`] or [`EventForm::into_patch`]
//! coerces the allow-listed fields into typed values.

use std::collections::HashMap;

use axum::extract::multipart::Field;
use axum::extract::Multipart;

use crate::assets::ImagePayload;
use crate::models::{EventDate, EventPatch, NewEvent};
use crate::utils::error::AppError;

/// Reserved part carrying the image file.
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FormField {
    Title,
    Description,
    Date,
    Location,
    Organizer,
}

impl FormField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(FormField::Title),
            "description" => Some(FormField::Description),
            "date" => Some(FormField::Date),
            "location" => Some(FormField::Location),
            "organizer" => Some(FormField::Organizer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventForm {
    fields: HashMap<String, String>,
    image: Option<ImagePayload>,
}

impl EventForm {
    pub fn new(fields: HashMap<String, String>, image: Option<ImagePayload>) -> Self {
        Self { fields, image }
    }

    /// Reads every part of the body. Repeated names keep the last value, and
    /// an empty image part counts as no image.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = EventForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Decode(e.body_text()))?
        {
            let name = field
                .name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Decode("form part without a name".to_string()))?;

            let is_file = field.file_name().is_some()
                || field
                    .content_type()
                    .map(|ct| !is_plain_text(ct))
                    .unwrap_or(false);

            if name == IMAGE_FIELD {
                if !is_file {
                    let text = read_text(&name, field).await?;
                    if text.trim().is_empty() {
                        form.image = None;
                        continue;
                    }
                    return Err(AppError::Decode(
                        "`image` must be a file upload".to_string(),
                    ));
                }

                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Decode(e.body_text()))?;

                form.image = (!bytes.is_empty()).then(|| ImagePayload {
                    bytes: bytes.to_vec(),
                    file_name,
                    content_type,
                });
                continue;
            }

            if is_file {
                return Err(AppError::Decode(format!(
                    "unexpected file in field `{name}`"
                )));
            }

            let value = read_text(&name, field).await?;
            form.fields.insert(name, value);
        }

        Ok(form)
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Coerces a create submission. The image is mandatory and every
    /// required field must be present and non-blank.
    pub fn into_new_event(self) -> Result<(NewEvent, ImagePayload), AppError> {
        let mut fields = typed_fields(self.fields)?;
        let image = self.image.ok_or(AppError::MissingImage)?;
        check_image(&image)?;

        let mut required = |field: FormField, label: &str| -> Result<String, AppError> {
            fields
                .remove(&field)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| AppError::Validation(format!("`{label}` is required")))
        };

        let title = required(FormField::Title, "title")?;
        let description = required(FormField::Description, "description")?;
        let date = parse_date(&required(FormField::Date, "date")?)?;
        let location = required(FormField::Location, "location")?;
        let organizer = fields
            .remove(&FormField::Organizer)
            .filter(|value| !value.is_empty());

        Ok((
            NewEvent {
                title,
                description,
                date,
                location,
                organizer,
                image: None,
            },
            image,
        ))
    }

    /// Coerces an update submission. Every field is optional, but a supplied
    /// field must still be valid. A blank organizer clears it.
    pub fn into_patch(self) -> Result<(EventPatch, Option<ImagePayload>), AppError> {
        let fields = typed_fields(self.fields)?;
        if let Some(image) = &self.image {
            check_image(image)?;
        }

        let mut patch = EventPatch::default();
        for (field, value) in fields {
            match field {
                FormField::Title => patch.title = Some(non_blank("title", value)?),
                FormField::Description => {
                    patch.description = Some(non_blank("description", value)?)
                }
                FormField::Date => patch.date = Some(parse_date(&value)?),
                FormField::Location => patch.location = Some(non_blank("location", value)?),
                FormField::Organizer => {
                    patch.organizer = Some((!value.is_empty()).then_some(value))
                }
            }
        }

        Ok((patch, self.image))
    }
}

/// Text parts must be UTF-8; no charset guessing or lossy replacement.
async fn read_text(name: &str, field: Field<'_>) -> Result<String, AppError> {
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Decode(e.body_text()))?;

    String::from_utf8(bytes.to_vec())
        .map_err(|_| AppError::Decode(format!("field `{name}` is not valid UTF-8")))
}

fn is_plain_text(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|media| media.trim().eq_ignore_ascii_case("text/plain"))
        .unwrap_or(false)
}

/// Applies the allow-list and trims every value.
fn typed_fields(raw: HashMap<String, String>) -> Result<HashMap<FormField, String>, AppError> {
    let mut unknown: Vec<String> = raw
        .keys()
        .filter(|name| FormField::from_name(name).is_none())
        .cloned()
        .collect();

    if !unknown.is_empty() {
        unknown.sort();
        return Err(AppError::Decode(format!(
            "unrecognized field(s): {}",
            unknown.join(", ")
        )));
    }

    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| {
            FormField::from_name(&name).map(|field| (field, value.trim().to_string()))
        })
        .collect())
}

fn non_blank(label: &str, value: String) -> Result<String, AppError> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("`{label}` must not be blank")));
    }
    Ok(value)
}

fn parse_date(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, AppError> {
    EventDate::parse(raw)
        .ok_or_else(|| AppError::Validation(format!("`date` is not a valid date: {raw:?}")))
}

/// Declared content types must look like an image. Generic binary uploads are
/// left for the asset store to judge.
fn check_image(image: &ImagePayload) -> Result<(), AppError> {
    match image.content_type.as_deref() {
        Some(ct) if !ct.starts_with("image/") && ct != "application/octet-stream" => Err(
            AppError::Validation(format!("`image` must be an image, got {ct}")),
        ),
        _ => Ok(()),
    }
}
