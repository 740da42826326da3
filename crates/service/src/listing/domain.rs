use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::model_listing::{self, ListingRow};

const MIB: usize = 1024 * 1024;

/// The four file inputs of a listing submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileSlot {
    Archive,
    Preview,
    Texture,
    ModelFbx,
}

impl FileSlot {
    pub const ALL: [FileSlot; 4] = [FileSlot::Archive, FileSlot::Preview, FileSlot::Texture, FileSlot::ModelFbx];

    /// Form field name carrying this slot.
    pub fn field(self) -> &'static str {
        match self {
            FileSlot::Archive => "file",
            FileSlot::Preview => "preview_image_url",
            FileSlot::Texture => "texture_url",
            FileSlot::ModelFbx => "model_fbx",
        }
    }

    pub fn from_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.field() == name)
    }

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            FileSlot::Archive => &["zip", "rar"],
            FileSlot::Preview | FileSlot::Texture => &["png", "jpg", "jpeg"],
            FileSlot::ModelFbx => &["fbx"],
        }
    }

    pub fn max_bytes(self) -> usize {
        match self {
            FileSlot::Archive | FileSlot::ModelFbx => 10 * MIB,
            FileSlot::Preview | FileSlot::Texture => 2 * MIB,
        }
    }

    pub fn required(self) -> bool { matches!(self, FileSlot::Archive | FileSlot::Preview) }

    /// Fixed file name inside the model folder.
    pub fn stored_name(self, ext: &str) -> String {
        match self {
            FileSlot::Archive => format!("archive.{ext}"),
            FileSlot::Preview => format!("preview.{ext}"),
            FileSlot::Texture => format!("texture.{ext}"),
            FileSlot::ModelFbx => "model.fbx".to_string(),
        }
    }
}

/// An uploaded file part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self { file_name: file_name.into(), bytes: bytes.into() }
    }

    /// Lower-cased extension of the client file name, if any.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize { self.bytes.len() }

    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}

/// Immutable state of the submission form.
///
/// Every change yields a new value; blank text and empty unnamed file parts
/// count as "not provided".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category_id: Option<String>,
    pub end_date: Option<String>,
    pub files: BTreeMap<FileSlot, UploadedFile>,
}

fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() { None } else { Some(value) }
}

impl ModelDraft {
    pub fn new() -> Self { Self::default() }

    pub fn with_title(self, title: impl Into<String>) -> Self { Self { title: non_blank(title), ..self } }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self { description: non_blank(description), ..self }
    }

    pub fn with_price(self, price: impl Into<String>) -> Self { Self { price: non_blank(price), ..self } }

    pub fn with_category_id(self, category_id: impl Into<String>) -> Self {
        Self { category_id: non_blank(category_id), ..self }
    }

    pub fn with_end_date(self, end_date: impl Into<String>) -> Self { Self { end_date: non_blank(end_date), ..self } }

    pub fn with_file(self, slot: FileSlot, file: UploadedFile) -> Self {
        let mut files = self.files.clone();
        if file.is_empty() && file.file_name.trim().is_empty() {
            files.remove(&slot);
        } else {
            files.insert(slot, file);
        }
        Self { files, ..self }
    }

    pub fn without_file(self, slot: FileSlot) -> Self {
        let mut files = self.files.clone();
        files.remove(&slot);
        Self { files, ..self }
    }

    /// Apply a text form field by name; unknown names leave the draft unchanged.
    pub fn with_field(self, name: &str, value: impl Into<String>) -> Self {
        match name {
            "title" => self.with_title(value),
            "description" => self.with_description(value),
            "price" => self.with_price(value),
            "category_id" => self.with_category_id(value),
            "end_date" => self.with_end_date(value),
            _ => self,
        }
    }

    pub fn file(&self, slot: FileSlot) -> Option<&UploadedFile> { self.files.get(&slot) }
}

/// Field-keyed validation messages, serialised as `{field: [message, ..]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, field: &str) -> Option<&[String]> { self.0.get(field).map(Vec::as_slice) }

    pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }

    pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// A submission that passed validation, ready to persist.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidListing {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: i64,
    pub end_date: Option<NaiveDate>,
    /// Present files with their validated lower-case extension.
    pub files: Vec<(FileSlot, String, UploadedFile)>,
}

impl ValidListing {
    pub fn into_new(self, author_id: Uuid) -> (model_listing::NewModelListing, Vec<(FileSlot, String, UploadedFile)>) {
        let new = model_listing::NewModelListing {
            author_id,
            title: self.title,
            description: self.description,
            price: self.price,
            category_id: self.category_id,
            end_date: self.end_date,
        };
        (new, self.files)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub profile_image: Option<String>,
}

impl From<models::user::Model> for AuthorSummary {
    fn from(u: models::user::Model) -> Self {
        Self { id: u.id, name: u.name, username: u.username, profile_image: u.profile_image }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: i64,
    pub title: String,
    pub code: String,
}

impl From<models::category::Model> for CategorySummary {
    fn from(c: models::category::Model) -> Self {
        Self { id: c.id, title: c.title, code: c.code }
    }
}

/// Listing row as returned by the paginated index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    #[serde(flatten)]
    pub row: ListingRow,
    pub author: Option<AuthorSummary>,
    pub category: Option<CategorySummary>,
}

/// Full listing record with relations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingDetail {
    #[serde(flatten)]
    pub model: model_listing::Model,
    pub author: Option<AuthorSummary>,
    pub category: Option<CategorySummary>,
}
