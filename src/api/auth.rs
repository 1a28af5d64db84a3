//! Authentication API endpoints
//!
//! Registering accounts and handing out access tokens

use axum::Extension;
use serde::Deserialize;

use crate::password::hash;
use crate::password::verify;
use crate::storage;
use crate::storage::CreateUserValues;
use crate::storage::Storage;

use super::Error;
use super::Form;
use super::JwtKeys;
use super::Success;
use super::current_user::Token;
use super::current_user::generate_token;

/// Credentials form, used for both registering and logging in
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsForm {
    /// Username of the user
    username: String,

    /// Password of the user
    password: String,
}

/// Register a new user
///
/// The token in the response can be used right away
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "someone", "password": "verysecret" }' \
///     http://localhost:8080/api/auth/register
/// ```
///
/// Response
/// ```json
/// { "data": { "token_type": "Bearer", "expires_in": 3600, "access_token": "some token" } }
/// ```
pub async fn register<S: Storage>(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    Form(form): Form<CredentialsForm>,
) -> Result<Success<Token>, Error> {
    tracing::debug!("Registration request for user: {}", form.username);

    if form.username.trim().is_empty() {
        return Err(Error::bad_request("Username can not be empty"));
    }

    if form.password.is_empty() {
        return Err(Error::bad_request("Password can not be empty"));
    }

    let hashed_password = hash(&form.password).map_err(Error::internal_server_error)?;

    let values = CreateUserValues {
        username: &form.username,
        hashed_password: &hashed_password,
    };

    // the storage checks the username and creates the user in one go
    let user = match storage.create_user(&values).await {
        Ok(user) => user,
        Err(storage::Error::AlreadyExists) => {
            return Err(Error::bad_request("Username already exists"));
        }
        Err(err) => return Err(Error::internal_server_error(err)),
    };

    let token = generate_token(&jwt_keys, &user)?;

    Ok(Success::created(token))
}

/// Get a token for a user "session"
///
/// The token can then be used to access the rest of the API routes by using it in the
/// `Authorization` header
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "someone", "password": "verysecret" }' \
///     http://localhost:8080/api/auth/login
/// ```
///
/// Response
/// ```json
/// { "data": { "token_type": "Bearer", "expires_in": 3600, "access_token": "some token" } }
/// ```
pub async fn login<S: Storage>(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    Form(form): Form<CredentialsForm>,
) -> Result<Success<Token>, Error> {
    tracing::debug!("Login request for user: {}", form.username);

    let user = storage
        .find_single_user_by_username(&form.username)
        .await
        .map_err(Error::internal_server_error)?;

    match user {
        Some(user) if verify(&user.hashed_password, &form.password) => {
            let token = generate_token(&jwt_keys, &user)?;

            Ok(Success::ok(token))
        }
        _ => Err(Error::bad_request("Invalid credentials")),
    }
}
