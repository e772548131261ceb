pub mod health;
pub mod images;
pub mod media_delete;
pub mod media_upload;
pub mod storage_init;
