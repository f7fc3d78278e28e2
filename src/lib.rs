//! Bookstore Lending Server
//!
//! A REST JSON API over a book catalog, with a borrow/return workflow that
//! caps how many books each reader holds and keeps stock counts in step.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire services over an already connected repository
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        let services = services::Services::new(
            repository,
            config.auth.clone(),
            config.lending.clone(),
        );

        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
