use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::services::jwt::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TEMP_TOKEN_TTL_SECS};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";
pub const SESSION_COOKIE: &str = "sid";
pub const TEMP_COOKIE: &str = "tempToken";

/// Cookie policy shared by all auth cookies: httpOnly, path=/, and a
/// cross-site-capable SameSite in production (the SPA is served from
/// another origin there).
#[derive(Clone, Copy)]
pub struct CookiePolicy {
    production: bool,
}

impl CookiePolicy {
    pub fn new(production: bool) -> Self {
        Self { production }
    }

    fn build(&self, name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_http_only(true);
        cookie.set_path("/");
        cookie.set_secure(self.production);
        cookie.set_same_site(if self.production {
            SameSite::None
        } else {
            SameSite::Lax
        });
        cookie.set_max_age(time_duration(max_age_secs));
        cookie
    }

    pub fn access(&self, token: String) -> Cookie<'static> {
        self.build(ACCESS_COOKIE, token, ACCESS_TOKEN_TTL_SECS)
    }

    pub fn refresh(&self, token: String) -> Cookie<'static> {
        self.build(REFRESH_COOKIE, token, REFRESH_TOKEN_TTL_SECS)
    }

    pub fn session(&self, session_id: String) -> Cookie<'static> {
        self.build(SESSION_COOKIE, session_id, REFRESH_TOKEN_TTL_SECS)
    }

    pub fn temp(&self, token: String) -> Cookie<'static> {
        self.build(TEMP_COOKIE, token, TEMP_TOKEN_TTL_SECS)
    }

    /// Expired clone of a cookie, for clearing it on the client.
    pub fn removal(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.build(name, String::new(), 0);
        cookie.make_removal();
        cookie
    }
}

fn time_duration(secs: i64) -> time::Duration {
    time::Duration::seconds(secs)
}
