use crate::extractors::JsonOrForm;
use crate::params::autopay::CallbackParams;
use crate::Error;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use domain::callback;

/// POST browser return from the gateway after authorization
///
/// Always answers with a 302 to the page matching the reported outcome.
#[utoipa::path(
    post,
    path = "/api/autopay/callback",
    request_body(
        content = CallbackParams,
        content_type = "application/x-www-form-urlencoded",
        description = "Also accepted as an application/json body"
    ),
    responses(
        (status = 302, description = "Redirect to /success, /failure or /pending"),
        (status = 400, description = "Missing or malformed response data")
    )
)]
pub async fn callback(
    JsonOrForm(params): JsonOrForm<CallbackParams>,
) -> Result<impl IntoResponse, Error> {
    let location = callback::redirect_location(params.response.as_deref())?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}
