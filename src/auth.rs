use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::util::{Transport, TransportError};

pub const LOGIN_URL: &str = "https://tvplayer.com/account/login";

static LOGIN_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"input.*?name="token".*?value="(\w+)""#).expect("login token pattern is valid")
});

/// Account credentials. Read once at the start of a resolution and never
/// modified afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Anti-forgery token from the login form, if the page has one.
pub fn extract_login_token(html: &str) -> Option<&str> {
    LOGIN_TOKEN_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Log in with `credentials`, leaving the session cookies in `transport`.
///
/// Returns `Ok(true)` only when the login post answers with a 302, which is
/// how the site signals success. A login page without a token is not an
/// error; the form is posted without one.
pub async fn login<T>(transport: &T, credentials: &Credentials) -> Result<bool, TransportError>
where
    T: Transport + ?Sized,
{
    let page = transport.get(LOGIN_URL, &[]).await?;
    let token = extract_login_token(&page.body);
    if token.is_none() {
        debug!("No token found on the login page");
    }

    let mut form = vec![
        ("email", credentials.email.as_str()),
        ("password", credentials.password.as_str()),
    ];
    if let Some(token) = token {
        form.push(("token", token));
    }

    let resp = transport.post_form(LOGIN_URL, &[], &form, false).await?;
    debug!("Login returned HTTP {}", resp.status);

    Ok(resp.status == 302)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, Method};

    const LOGIN_PAGE: &str = r#"<form method="post">
<input type="hidden" name="token" value="abc123">
<input type="email" name="email">
</form>"#;

    #[test]
    fn token_from_login_page() {
        assert_eq!(extract_login_token(LOGIN_PAGE), Some("abc123"));
        assert_eq!(
            extract_login_token(r#"<input id="t" name="token" class="x" value="f00_Ba4">"#),
            Some("f00_Ba4")
        );
    }

    #[test]
    fn no_token_on_page() {
        assert_eq!(extract_login_token("<form><input name=\"email\"></form>"), None);
        assert_eq!(extract_login_token(r#"<input name="other" value="abc">"#), None);
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("me@example.com", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("me@example.com"));
        assert!(!printed.contains("hunter2"));
    }

    #[tokio::test]
    async fn login_posts_form_with_token() {
        let transport = FakeTransport::new()
            .on(Method::Get, LOGIN_URL, 200, LOGIN_PAGE)
            .on(Method::Post, LOGIN_URL, 302, "");

        let ok = login(&transport, &Credentials::new("me@example.com", "pw"))
            .await
            .expect("login should not error");
        assert!(ok);

        let posts: Vec<_> = transport
            .requests_to(LOGIN_URL)
            .into_iter()
            .filter(|r| r.method == Method::Post)
            .collect();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert!(!post.follow_redirects);
        assert_eq!(post.form_value("email"), Some("me@example.com"));
        assert_eq!(post.form_value("password"), Some("pw"));
        assert_eq!(post.form_value("token"), Some("abc123"));
    }

    #[tokio::test]
    async fn login_without_token_still_posts() {
        let transport = FakeTransport::new()
            .on(Method::Get, LOGIN_URL, 200, "<html>no form here</html>")
            .on(Method::Post, LOGIN_URL, 302, "");

        let ok = login(&transport, &Credentials::new("me@example.com", "pw"))
            .await
            .expect("missing token should not error");
        assert!(ok);

        let post = transport.requests().pop().expect("login post was sent");
        assert_eq!(post.method, Method::Post);
        assert_eq!(post.form_value("token"), None);
    }

    #[tokio::test]
    async fn only_302_is_success() {
        for status in [200, 301, 303, 401] {
            let transport = FakeTransport::new()
                .on(Method::Get, LOGIN_URL, 200, LOGIN_PAGE)
                .on(Method::Post, LOGIN_URL, status, "bad password");

            let ok = login(&transport, &Credentials::new("me@example.com", "pw"))
                .await
                .expect("login should not error");
            assert!(!ok, "HTTP {} must not count as a login", status);
        }
    }
}
