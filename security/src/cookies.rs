// security/src/cookies.rs
//
// Just enough cookie handling for the session and XSRF cookies.

pub const SESSION_COOKIE: &str = "pronto_session";
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";

/// Finds `name` in a `Cookie` request header value.
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub max_age_secs: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
}

impl<'a> SetCookie<'a> {
    pub fn session(token: &'a str, ttl_hours: i64, secure: bool) -> Self {
        SetCookie {
            name: SESSION_COOKIE,
            value: token,
            max_age_secs: Some(ttl_hours.saturating_mul(3600)),
            http_only: true,
            secure,
        }
    }

    /// The XSRF cookie must stay readable by scripts.
    pub fn xsrf(token: &'a str, secure: bool) -> Self {
        SetCookie {
            name: XSRF_COOKIE,
            value: token,
            max_age_secs: None,
            http_only: false,
            secure,
        }
    }

    pub fn expired(name: &'a str, secure: bool) -> Self {
        SetCookie {
            name,
            value: "",
            max_age_secs: Some(0),
            http_only: true,
            secure,
        }
    }

    /// Renders the `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        let mut out = format!("{}={}; Path=/; SameSite=Lax", self.name, self.value);
        if let Some(max_age) = self.max_age_secs {
            out.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }
}
