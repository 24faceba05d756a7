pub mod generate;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use larder_core::{GenerationRequest, NutritionInfo, Recipe};
use utoipa::OpenApi;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(generate::generate_recipe))
}

#[derive(OpenApi)]
#[openapi(
    paths(generate::generate_recipe),
    components(schemas(
        GenerationRequest,
        Recipe,
        NutritionInfo,
        generate::GenerateSuccess,
        generate::GenerateFailure,
    ))
)]
pub struct ApiDoc;
