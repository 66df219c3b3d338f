//! Server-rendered pages.
//!
//! Minimal HTML shells; the reader-facing frontend proper is a separate
//! project. What matters here is the guard behavior: `/write` and `/admin`
//! resolve an identity before rendering or redirect to `/login`.

use axum::response::Html;
use inkpress_auth::middleware::{PageAdmin, PageAuth};

/// `GET /`: public home page.
pub async fn home() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>Inkpress</title></head>
<body>
    <h1>Inkpress</h1>
    <p>A small press for your words.</p>
    <p><a href="/login">Log in</a> &middot; <a href="/write">Write</a></p>
</body>
</html>"#,
    )
}

/// `GET /login`: login page shell. The form posts to `/users/log-in`.
pub async fn login() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>Log in - Inkpress</title></head>
<body>
    <h1>Log in</h1>
    <form method="post" action="/users/log-in">
        <label>Username <input name="username" autocomplete="username"></label>
        <label>Password <input name="password" type="password" autocomplete="current-password"></label>
        <button type="submit">Log in</button>
    </form>
</body>
</html>"#,
    )
}

/// `GET /write`: author dashboard. Any authenticated user.
pub async fn write(PageAuth(identity): PageAuth) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Write - Inkpress</title></head>
<body>
    <h1>Write</h1>
    <p>Signed in as {}.</p>
</body>
</html>"#,
        identity.username
    ))
}

/// `GET /admin`: admin dashboard. Admin role required.
pub async fn admin(PageAdmin(identity): PageAdmin) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Admin - Inkpress</title></head>
<body>
    <h1>Administration</h1>
    <p>Signed in as {} ({}).</p>
</body>
</html>"#,
        identity.username, identity.role
    ))
}
