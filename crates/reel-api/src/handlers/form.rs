//! Form page handler.

use axum::extract::State;
use axum::response::Html;

use crate::pages;
use crate::state::AppState;

/// Upload form.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(pages::index_page(state.render_config().max_files))
}
