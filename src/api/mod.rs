//! All API endpoint setup

use axum::Router;
use axum::routing::get;
use axum::routing::post;

use crate::storage::Storage;

pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use request::Form;
pub use request::PathParameters;
pub use request::QueryParameters;
pub use response::Error;
pub use response::Success;

mod auth;
mod current_user;
mod notes;
mod request;
mod response;
mod statistics;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let auth = Router::new()
        .route("/register", post(auth::register::<S>))
        .route("/login", post(auth::login::<S>));

    Router::new()
        .nest("/auth", auth)
        .route("/notes", get(notes::list::<S>).post(notes::create::<S>))
        .route(
            "/notes/{note}",
            get(notes::single::<S>)
                .put(notes::update::<S>)
                .delete(notes::delete::<S>),
        )
        .route("/statistics", get(statistics::summary::<S>))
}

/// Anything not matching a route
pub async fn not_found() -> Error {
    Error::not_found("Not found")
}
