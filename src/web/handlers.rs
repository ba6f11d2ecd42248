use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::date::{format_countdown, today_key, until_next_reset};
use crate::error::{Error, Result};
use crate::pdf::{merge_pdfs, protect_pdf, MergeOptions, ProtectOptions};
use crate::web::error::WebError;
use crate::web::templates::{IndexTemplate, MergeTemplate, ProtectTemplate};
use crate::web::upload::{secure_filename, RequestWorkspace, UploadForm};
use crate::web::AppState;

const MERGED_FILENAME: &str = "merged.pdf";
const NO_PDFS_MESSAGE: &str = "Please upload at least one PDF.";
const PROTECT_INPUT_MESSAGE: &str = "Please upload a PDF and enter a password.";

/// GET /
pub async fn index(State(state): State<AppState>) -> IndexTemplate {
    IndexTemplate {
        daily_limit: state.gate.limit(),
    }
}

/// GET /merge
pub async fn merge_form(State(state): State<AppState>) -> std::result::Result<MergeTemplate, WebError> {
    let remaining = remaining_today(&state).await?;

    Ok(MergeTemplate {
        remaining,
        daily_limit: state.gate.limit(),
        resets_in: format_countdown(until_next_reset()),
        max_upload_mb: state.config.server.max_upload_mb,
    })
}

/// GET /protect
pub async fn protect_form(State(state): State<AppState>) -> std::result::Result<ProtectTemplate, WebError> {
    let remaining = remaining_today(&state).await?;

    Ok(ProtectTemplate {
        remaining,
        daily_limit: state.gate.limit(),
        resets_in: format_countdown(until_next_reset()),
        max_upload_mb: state.config.server.max_upload_mb,
    })
}

/// POST /merge
///
/// Concatenates every `pdfs` part in submission order.
pub async fn merge(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Response, WebError> {
    let today = admit(&state).await?;

    let form = UploadForm::read(multipart, state.config.server.max_upload_mb).await?;
    let uploads: Vec<_> = form.files("pdfs").collect();
    if uploads.is_empty() {
        return Err(WebError::Validation(NO_PDFS_MESSAGE));
    }

    let workspace = state.workspace().await?;
    let mut input_paths = Vec::with_capacity(uploads.len());
    for (index, upload) in uploads.iter().enumerate() {
        input_paths.push(workspace.stage(index, upload).await?);
    }

    let output_path = workspace.output_path(MERGED_FILENAME);
    let options = MergeOptions {
        input_paths,
        output_path: output_path.clone(),
    };
    let pages = run_blocking(move || merge_pdfs(&options)).await?;
    let bytes = tokio::fs::read(&output_path).await?;

    let used = state.usage.increment(&today).await?;
    info!(
        "Request {} merged {} files into {} pages ({} used today)",
        workspace.id(),
        uploads.len(),
        pages,
        used
    );

    Ok(pdf_attachment(MERGED_FILENAME, bytes))
}

/// POST /protect
///
/// Re-encodes the `pdf` part encrypted with `password`.
pub async fn protect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Response, WebError> {
    let today = admit(&state).await?;

    let form = UploadForm::read(multipart, state.config.server.max_upload_mb).await?;
    let password = form.text("password").unwrap_or_default();
    let upload = match form.files("pdf").next() {
        Some(upload) if !upload.data.is_empty() && !password.is_empty() => upload,
        _ => return Err(WebError::Validation(PROTECT_INPUT_MESSAGE)),
    };

    let workspace = state.workspace().await?;
    let input_path = workspace.stage(0, upload).await?;
    let download_name = format!("protected_{}", secure_filename(&upload.file_name));
    let output_path = workspace.output_path(&download_name);

    let options = ProtectOptions {
        input_path,
        output_path: output_path.clone(),
        password: password.to_string(),
    };
    let pages = run_blocking(move || protect_pdf(&options)).await?;
    let bytes = tokio::fs::read(&output_path).await?;

    let used = state.usage.increment(&today).await?;
    info!(
        "Request {} protected {} ({} pages, {} used today)",
        workspace.id(),
        download_name,
        pages,
        used
    );

    Ok(pdf_attachment(&download_name, bytes))
}

/// Check today's quota and return the day key the action will be billed to
async fn admit(state: &AppState) -> std::result::Result<String, WebError> {
    let today = today_key();
    let used = state.usage.count_for(&today).await?;

    if let Err(denied) = state.gate.check(used) {
        warn!("Quota exhausted for {} ({} of {})", today, used, denied.limit);
        return Err(denied.into());
    }

    Ok(today)
}

async fn remaining_today(state: &AppState) -> Result<u32> {
    let used = state.usage.count_for(&today_key()).await?;
    Ok(state.gate.remaining(used))
}

/// Run lopdf work off the async runtime
async fn run_blocking<T, F>(job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| Error::General(format!("PDF task failed: {}", e)))?
}

fn pdf_attachment(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}
