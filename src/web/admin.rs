//! Operator endpoint for zeroing today's counter

use axum::{extract::State, Form};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::date::today_key;
use crate::web::error::WebError;
use crate::web::AppState;

const RESET_OK_MESSAGE: &str = "Usage reset successfully for today.";

#[derive(Debug, Deserialize)]
pub struct ResetForm {
    key: Option<String>,
}

/// POST /reset-usage
///
/// Reports success whether or not today had an entry to reset.
pub async fn reset_usage(
    State(state): State<AppState>,
    Form(form): Form<ResetForm>,
) -> Result<&'static str, WebError> {
    let Some(secret) = state.config.admin_secret() else {
        warn!("Reset requested but no admin secret is configured");
        return Err(WebError::Unauthorized);
    };

    if !tokens_match(form.key.as_deref().unwrap_or_default(), secret) {
        warn!("Reset requested with a bad admin key");
        return Err(WebError::Unauthorized);
    }

    let today = today_key();
    let changed = state.usage.reset_to(&today, 0).await?;
    info!("Usage for {} reset by admin (had entry: {})", today, changed);

    Ok(RESET_OK_MESSAGE)
}

/// Compare two secrets without leaking where they differ
///
/// Both sides are hashed first so the comparison length is fixed and does
/// not reveal the secret's length.
pub fn tokens_match(supplied: &str, expected: &str) -> bool {
    let supplied = Sha256::digest(supplied.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());

    supplied
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
