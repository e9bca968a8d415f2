//! Server-rendered pages.
//!
//! Minimal HTML showing how the guards and notices are used from handlers.

use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use kenni_auth::http::LoginParams;
use kenni_auth::identity::mask_kennitala;
use kenni_auth::notice::Notice;
use kenni_auth::oauth::sanitize_return_path;
use kenni_auth::prelude::*;

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"is\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_html(title)
    ))
}

fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|n| {
            format!(
                "<p class=\"toast\" id=\"{}\">{}</p>",
                escape_html(&n.id),
                escape_html(&n.message)
            )
        })
        .collect()
}

/// `GET /`
pub async fn home(MaybeSession(session): MaybeSession) -> Html<String> {
    let body = match session {
        Some(session) => format!(
            "<p>Innskráð(ur): {}</p><p><a href=\"/dashboard\">Yfirlit</a></p>\
             <form method=\"post\" action=\"/api/auth/logout\"><button>Útskrá</button></form>",
            escape_html(&session.display_name)
        ),
        None => "<p><a href=\"/login\">Innskráning</a></p>".to_string(),
    };
    layout("Acme", &body)
}

/// `GET /login?next=`
///
/// Shows pending notices once. A signed-in visitor goes straight to `next`.
pub async fn login_page(
    State(auth): State<AuthState>,
    MaybeSession(session): MaybeSession,
    params: Result<Query<LoginParams>, QueryRejection>,
    jar: CookieJar,
) -> Response {
    let next = params
        .ok()
        .and_then(|Query(p)| p.next)
        .map(|next| sanitize_return_path(&next));

    if session.is_some() {
        let target = next.unwrap_or_else(|| "/".to_string());
        return Redirect::to(&target).into_response();
    }

    let (jar, notices) = auth.notices().take(jar);
    let start = match next {
        Some(next) => format!("/api/auth/login?next={}", urlencoding::encode(&next)),
        None => "/api/auth/login".to_string(),
    };
    let body = format!(
        "{}<h1>Innskráning</h1><p><a href=\"{}\">Skrá inn með Kenni</a></p>",
        render_notices(&notices),
        escape_html(&start)
    );
    (jar, layout("Innskráning", &body)).into_response()
}

/// `POST /notices/{id}/dismiss`
pub async fn dismiss_notice(
    State(auth): State<AuthState>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    (auth.notices().dismiss(jar, &id), StatusCode::NO_CONTENT)
}

/// `GET /dashboard`
pub async fn dashboard(Authenticated(session): Authenticated) -> Html<String> {
    let body = format!(
        "<h1>Halló, {}</h1><p>Hlutverk: {}</p>",
        escape_html(&session.display_name),
        session.role
    );
    layout("Yfirlit", &body)
}

/// `GET /profile`
pub async fn profile(CurrentUser { user, .. }: CurrentUser) -> Html<String> {
    let body = format!(
        "<h1>{}</h1><dl><dt>Kennitala</dt><dd>{}</dd><dt>Fæðingardagur</dt><dd>{}</dd><dt>Tegund</dt><dd>{}</dd></dl>",
        escape_html(&user.full_name),
        mask_kennitala(&user.personal_code),
        user.birth_date,
        user.kennital_type
    );
    layout("Prófíll", &body)
}

/// `GET /admin`
pub async fn admin(CurrentAdmin { user, .. }: CurrentAdmin) -> Html<String> {
    let body = format!("<h1>Stjórnborð</h1><p>{}</p>", escape_html(&user.full_name));
    layout("Stjórnborð", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Jón\" & 'Gunna'</b>"),
            "&lt;b&gt;&quot;Jón&quot; &amp; &#39;Gunna&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_render_notices_escapes_messages() {
        let html = render_notices(&[Notice {
            id: "toast-1".to_string(),
            message: "<script>".to_string(),
        }]);
        assert_eq!(html, "<p class=\"toast\" id=\"toast-1\">&lt;script&gt;</p>");
    }
}
