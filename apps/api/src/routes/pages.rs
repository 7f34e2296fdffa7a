use axum::response::Html;

const INDEX: &str = include_str!("../../assets/index.html");
const PDF_COMBINER: &str = include_str!("../../assets/pdf-combiner.html");

/// GET /
pub async fn index_page() -> Html<&'static str> {
    Html(INDEX)
}

/// GET /pdf-combiner
pub async fn pdf_combiner_page() -> Html<&'static str> {
    Html(PDF_COMBINER)
}
