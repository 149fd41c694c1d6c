pub mod dashboard;
mod dto;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod model;
pub mod store;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
