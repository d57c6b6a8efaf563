use axum::{extract::State, Json};
use legitima_directory::UserRecord;
use std::sync::Arc;
use tracing::instrument;

use crate::{error::ApiError, extractors::SessionUser, state::AppState};

/// Return the directory record of the credential's subject.
///
/// A verified credential whose email is not in the directory is a server
/// side inconsistency, not an authentication failure.
#[instrument(skip_all, fields(email = %user.email))]
pub async fn profile(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> Result<Json<UserRecord>, ApiError> {
    let record = state
        .directory
        .find_by_email(&user.email)
        .await
        .map_err(ApiError::Storage)?;

    Ok(Json(record))
}
