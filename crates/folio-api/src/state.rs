//! Application state shared by every handler.

use folio_core::Config;
use folio_services::{ImageValidator, MediaStorageService};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Upload pipeline bound to the configured bucket.
    pub media: MediaStorageService,
    /// HEAD probe behind the profile image check.
    pub images: ImageValidator,
}
