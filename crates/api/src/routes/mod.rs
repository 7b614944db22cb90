pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{clean, inpaint};
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// POST   /inpaint          start an inpainting job (multipart)
/// GET    /inpaint/{id}     poll an inpainting job
/// POST   /clean            remove a masked object (multipart, returns image/png)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/inpaint", post(inpaint::create_inpaint_job))
        .route("/inpaint/{id}", get(inpaint::get_inpaint_job))
        .route("/clean", post(clean::clean_image))
}
