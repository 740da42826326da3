use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(utoipa::ToSchema)]
pub struct RegisterRequest { pub email: String, pub name: String, pub username: Option<String>, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

/// Multipart body of `POST /models`
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ModelUploadForm {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: i64,
    /// `YYYY-MM-DD`, must be after today
    pub end_date: Option<String>,
    /// zip / rar, ≤ 10 MiB
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// png / jpg / jpeg, ≤ 2 MiB
    #[schema(value_type = String, format = Binary)]
    pub preview_image_url: Vec<u8>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub texture_url: Option<Vec<u8>>,
    /// fbx, ≤ 10 MiB
    #[schema(value_type = Option<String>, format = Binary)]
    pub model_fbx: Option<Vec<u8>>,
}

#[derive(ToSchema)]
pub struct AuthorDoc { pub id: Uuid, pub name: String, pub username: Option<String>, pub profile_image: Option<String> }

#[derive(ToSchema)]
pub struct CategoryDoc { pub id: i64, pub title: String, pub code: String }

#[derive(ToSchema)]
pub struct ListingDoc {
    pub id: i64,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: i64,
    pub end_date: Option<String>,
    pub file_url: Option<String>,
    pub preview_image_url: Option<String>,
    pub created_at: String,
    pub author: Option<AuthorDoc>,
    pub category: Option<CategoryDoc>,
}

#[derive(ToSchema)]
pub struct ListingPageDoc {
    pub data: Vec<ListingDoc>,
    pub path: String,
    pub per_page: u64,
    pub next_cursor: Option<String>,
    pub next_page_url: Option<String>,
    pub prev_cursor: Option<String>,
    pub prev_page_url: Option<String>,
}

#[derive(ToSchema)]
pub struct CreatedDoc { pub message: String, pub model: ListingDoc }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::models::index,
        crate::routes::models::store,
        crate::routes::models::show,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ModelUploadForm,
            AuthorDoc,
            CategoryDoc,
            ListingDoc,
            ListingPageDoc,
            CreatedDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "models")
    )
)]
pub struct ApiDoc;
