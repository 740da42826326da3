//! Pure validation of a listing submission.
//!
//! No I/O: the category existence check happens afterwards in the service,
//! everything else is decided here from the draft and the reference date.

use chrono::{DateTime, NaiveDate};

use super::domain::{FieldErrors, FileSlot, ModelDraft, ValidListing};

pub const TITLE_MIN: usize = 2;
pub const TITLE_MAX: usize = 255;

/// Human label of a form field: `category_id` -> `category id`.
pub fn attribute(field: &str) -> String { field.replace('_', " ") }

pub fn required_message(field: &str) -> String { format!("The {} field is required.", attribute(field)) }

pub fn category_missing_message() -> String { "The selected category id is invalid.".to_string() }

/// Validate `draft` as of `today` (UTC calendar date).
///
/// Collects every failing field instead of stopping at the first one.
pub fn validate(draft: &ModelDraft, today: NaiveDate) -> Result<ValidListing, FieldErrors> {
    let mut errors = FieldErrors::default();

    let title = match draft.title.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add("title", required_message("title"));
            None
        }
        Some(t) => {
            let len = t.chars().count();
            if len < TITLE_MIN {
                errors.add("title", format!("The title field must be at least {TITLE_MIN} characters."));
            } else if len > TITLE_MAX {
                errors.add("title", format!("The title field must not be greater than {TITLE_MAX} characters."));
            }
            Some(t.to_string())
        }
    };

    let price = match draft.price.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add("price", required_message("price"));
            None
        }
        Some(raw) => match raw.parse::<f64>() {
            Ok(p) if p.is_finite() => {
                if p < 0.0 {
                    errors.add("price", "The price field must be at least 0.");
                }
                Some(p)
            }
            _ => {
                errors.add("price", "The price field must be a number.");
                None
            }
        },
    };

    let category_id = match draft.category_id.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add("category_id", required_message("category_id"));
            None
        }
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("category_id", "The category id field must be an integer.");
                None
            }
        },
    };

    let end_date = match draft.end_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match parse_date(raw) {
            Some(d) if d > today => Some(d),
            Some(_) => {
                errors.add("end_date", "The end date field must be a date after today.");
                None
            }
            None => {
                errors.add("end_date", "The end date field must be a valid date.");
                None
            }
        },
    };

    let mut files = Vec::new();
    for slot in FileSlot::ALL {
        let field = slot.field();
        let Some(file) = draft.file(slot) else {
            if slot.required() {
                errors.add(field, required_message(field));
            }
            continue;
        };
        let allowed = slot.allowed_extensions();
        match file.extension() {
            Some(ext) if allowed.contains(&ext.as_str()) => {
                if file.len() > slot.max_bytes() {
                    errors.add(
                        field,
                        format!("The {} field must not be greater than {} kilobytes.", attribute(field), slot.max_bytes() / 1024),
                    );
                } else {
                    files.push((slot, ext, file.clone()));
                }
            }
            _ => errors.add(field, format!("The {} field must be a file of type: {}.", attribute(field), allowed.join(", "))),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    match (title, price, category_id) {
        (Some(title), Some(price), Some(category_id)) => Ok(ValidListing {
            title,
            description: draft.description.as_deref().map(str::trim).filter(|d| !d.is_empty()).map(str::to_string),
            price,
            category_id,
            end_date,
            files,
        }),
        // every None above recorded an error
        _ => Err(errors),
    }
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
