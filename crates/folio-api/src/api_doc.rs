//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio API",
        version = "0.1.0",
        description = "Media pipeline for a personal-branding site: bucket bootstrap, gated uploads into public object storage, deletion by public URL, and profile image reference checks. All JSON endpoints live under /api/."
    ),
    paths(
        // Storage
        handlers::storage_init::init_storage,
        // Media
        handlers::media_upload::upload_media,
        handlers::media_delete::delete_media,
        // Images
        handlers::images::validate_image,
        handlers::images::safe_image,
    ),
    components(
        schemas(
            handlers::storage_init::StorageInitResponse,
            handlers::media_upload::UploadMediaResponse,
            handlers::media_delete::DeleteMediaRequest,
            handlers::media_delete::DeleteMediaResponse,
            handlers::images::ValidateImageRequest,
            handlers::images::ValidateImageResponse,
            handlers::images::SafeImageResponse,
            folio_core::MediaCategory,
            // Error
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "storage", description = "Bucket bootstrap"),
        (name = "media", description = "Upload and delete stored files"),
        (name = "images", description = "Profile image reference checks")
    )
)]
pub struct ApiDoc;
