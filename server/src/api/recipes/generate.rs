use crate::api::ErrorResponse;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use larder_core::{GenerateError, GenerationRequest, Recipe};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenerateSuccess {
    /// Always true
    pub success: bool,
    pub data: Recipe,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenerateFailure {
    /// Always false
    pub success: bool,
    pub message: String,
    /// Verbatim model output, present only when it could not be parsed
    #[serde(rename = "rawResponse", skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

/// Outcome of one generation request, as sent to the caller.
pub enum GenerateResponse {
    Success(Recipe),
    Failure(GenerateError),
}

impl IntoResponse for GenerateResponse {
    fn into_response(self) -> Response {
        match self {
            GenerateResponse::Success(recipe) => (
                StatusCode::OK,
                Json(GenerateSuccess {
                    success: true,
                    data: recipe,
                }),
            )
                .into_response(),
            GenerateResponse::Failure(error) => {
                let status = if error.is_input_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                let body = GenerateFailure {
                    success: false,
                    message: error.user_message().to_string(),
                    raw_response: error.raw_response().map(str::to_string),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}

/// Generate a recipe from a list of ingredients
///
/// Sends the ingredients to the configured language model and returns the
/// recipe it produced. When the model answers with something that is not a
/// valid recipe, the raw answer is returned in `rawResponse`.
#[utoipa::path(
    post,
    path = "/api/recipes/generate",
    tag = "recipes",
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "Generated recipe", body = GenerateSuccess),
        (status = 400, description = "Missing or invalid ingredients", body = GenerateFailure),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Model failed or returned an unusable recipe", body = GenerateFailure)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_recipe(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> GenerateResponse {
    // An unreadable body is treated like one without ingredients.
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::info!(error = %rejection.body_text(), "Unreadable generation request body");
            GenerationRequest::default()
        }
    };

    match larder_core::generate_recipe(state.provider.as_ref(), &request, &state.limits).await {
        Ok(recipe) => {
            tracing::info!(title = %recipe.title, "Recipe generated");
            GenerateResponse::Success(recipe)
        }
        Err(e) => {
            if e.is_input_error() {
                tracing::info!(error = %e, "Rejected generation request");
            }
            GenerateResponse::Failure(e)
        }
    }
}
