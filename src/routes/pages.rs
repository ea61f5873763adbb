//! Placeholder pages. Rendering lives in the front-end; these exist so the
//! edge guard has real routes to sit in front of.

use axum::response::Html;

fn page(title: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title} · jobtrail</title></head>\
         <body><div id=\"app\" data-page=\"{title}\"></div></body></html>"
    ))
}

pub async fn home() -> Html<String> {
    page("Home")
}

pub async fn login() -> Html<String> {
    page("Login")
}

pub async fn register() -> Html<String> {
    page("Register")
}

pub async fn dashboard() -> Html<String> {
    page("Dashboard")
}

pub async fn jobs() -> Html<String> {
    page("Jobs")
}

pub async fn applications() -> Html<String> {
    page("Applications")
}

pub async fn settings() -> Html<String> {
    page("Settings")
}

pub async fn admin_home() -> Html<String> {
    page("Admin")
}

pub async fn admin_login() -> Html<String> {
    page("Admin Login")
}
