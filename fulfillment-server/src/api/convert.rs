//! Command response to API error conversion

use shared::error::AppError;
use shared::order::CommandResponse;

/// Turn a failed [`CommandResponse`] into the API error envelope.
///
/// Successful responses pass through untouched; call only after
/// checking `response.success`.
pub fn command_failure(response: CommandResponse) -> AppError {
    match response.error {
        Some(err) => AppError::with_message(err.code.error_code(), err.message)
            .with_detail("command_id", response.command_id),
        None => AppError::internal("command failed without error detail"),
    }
}
