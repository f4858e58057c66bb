use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};

use crate::models::{Flash, FlashLevel};

/// Name of the cookie carrying the pending notice across a redirect.
pub const FLASH_COOKIE: &str = "flash";

fn level_tag(level: FlashLevel) -> &'static str {
    match level {
        FlashLevel::Success => "success",
        FlashLevel::Info => "info",
        FlashLevel::Warning => "warning",
        FlashLevel::Danger => "danger",
    }
}

fn parse_level(tag: &str) -> Option<FlashLevel> {
    match tag {
        "success" => Some(FlashLevel::Success),
        "info" => Some(FlashLevel::Info),
        "warning" => Some(FlashLevel::Warning),
        "danger" => Some(FlashLevel::Danger),
        _ => None,
    }
}

/// Encodes a notice as `<level>:<message>`.
pub fn encode(notice: &Flash) -> String {
    format!("{}:{}", level_tag(notice.level), notice.message)
}

pub fn decode(value: &str) -> Option<Flash> {
    let (tag, message) = value.split_once(':')?;
    Some(Flash::new(parse_level(tag)?, message))
}

/// Queues `notice` for the next page the client loads.
pub fn push(jar: CookieJar, notice: &Flash) -> CookieJar {
    let cookie = Cookie::build((FLASH_COOKIE, encode(notice)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Pops the pending notice, if any. The returned jar clears the cookie, so the
/// notice is shown exactly once.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, Vec::new());
    };
    let flashes: Vec<Flash> = decode(cookie.value()).into_iter().collect();
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, flashes)
}
