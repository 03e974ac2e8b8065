use axum::response::Html;

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Render the index page with the default model preselected. When the server
/// holds its own credential the key field becomes optional.
pub fn render_index(default_model: &str, server_has_key: bool) -> Html<String> {
    let html = INDEX_HTML
        .replace("{{ default_model }}", &html_escape(default_model))
        .replace(
            "{{ server_key }}",
            if server_has_key { "true" } else { "false" },
        );
    Html(html)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
