use thiserror::Error;
use serde::Serialize;

use crate::core::store::StoreError;

#[derive(Error, Debug, Serialize)]
pub enum AppError {
    #[error("Store Error: {0}")]
    Store(String),

    #[error("Window Error: {0}")]
    Window(String),

    #[error("System Error: {0}")]
    System(String),

    #[error("Validation Error: {0}")]
    Validation(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<tauri::Error> for AppError {
    fn from(err: tauri::Error) -> Self {
        AppError::Window(err.to_string())
    }
}

// Helper for Tauri Result
pub type AppResult<T> = Result<T, AppError>;
