pub mod health;
pub mod pages;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::pdf::handlers as pdf;
use crate::resumes::handlers as resumes;
use crate::session::{handlers as session, require_session};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    let protected = Router::new()
        .route("/", get(pages::index_page))
        .route("/pdf-combiner", get(pages::pdf_combiner_page))
        .route("/logout", get(session::handle_logout))
        // Ashby browsing
        .route("/api/jobs", get(candidates::handle_list_jobs))
        .route("/api/jobs/:job_id/stages", get(candidates::handle_list_stages))
        .route(
            "/api/jobs/:job_id/candidates",
            get(candidates::handle_list_candidates),
        )
        // Downloads
        .route(
            "/api/candidates/:candidate_id/resume",
            get(resumes::handle_download_resume),
        )
        .route("/api/resumes/archive", post(resumes::handle_download_archive))
        // PDF combiner
        .route(
            "/api/pdfs/combine",
            post(pdf::handle_combine).layer(upload_limit),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/login",
            get(session::handle_login_page).post(session::handle_login),
        )
        .merge(protected)
        .with_state(state)
}
