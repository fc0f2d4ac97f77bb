use axum::http::{HeaderMap, header};

pub const SESSION_COOKIE: &str = "blog_session";
pub const VIEWED_POSTS_COOKIE: &str = "viewed_posts";

/// Finds a cookie value by name across all `Cookie` headers.
pub fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let (key, val) = cookie.split_once('=')?;
            if key.trim() == name {
                Some(val.trim())
            } else {
                None
            }
        })
}

pub fn session_cookie(token: &str, max_age_hours: u64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        max_age_hours * 3600
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

pub fn viewed_posts_cookie(token: &str, max_age_secs: u64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        VIEWED_POSTS_COOKIE, token, max_age_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; blog_session=abc123; viewed_posts=x.y.z"),
        );

        assert_eq!(get_cookie_value(&headers, SESSION_COOKIE), Some("abc123"));
        assert_eq!(get_cookie_value(&headers, VIEWED_POSTS_COOKIE), Some("x.y.z"));
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn reads_across_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("blog_session=tok"));
        assert_eq!(get_cookie_value(&headers, SESSION_COOKIE), Some("tok"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        assert!(clear_session_cookie().contains("Max-Age=0"));
        assert!(session_cookie("t", 24).contains("Max-Age=86400"));
    }
}
