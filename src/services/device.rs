use axum::http::HeaderMap;

/// Best-effort device metadata recorded on each session. Informational for
/// the "your devices" view only; nothing here is trusted for authorization.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub browser: Option<String>,
    pub ip_address: Option<String>,
}

impl DeviceInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_agent = headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if user_agent.is_empty() {
            return Self {
                ip_address,
                ..Self::default()
            };
        }

        Self {
            device_name: None,
            device_type: Some(device_type(user_agent).to_string()),
            os: os_name(user_agent).map(str::to_string),
            browser: browser_name(user_agent).map(str::to_string),
            ip_address,
        }
    }
}

fn device_type(ua: &str) -> &'static str {
    if ua.contains("Tablet") || ua.contains("iPad") {
        "tablet"
    } else if ua.contains("Mobile") || ua.contains("Android") || ua.contains("iPhone") {
        "mobile"
    } else {
        "desktop"
    }
}

fn os_name(ua: &str) -> Option<&'static str> {
    if ua.contains("Android") {
        Some("Android")
    } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iOS") {
        Some("iOS")
    } else if ua.contains("Windows") {
        Some("Windows")
    } else if ua.contains("Mac OS") || ua.contains("Macintosh") {
        Some("macOS")
    } else if ua.contains("Linux") {
        Some("Linux")
    } else {
        None
    }
}

fn browser_name(ua: &str) -> Option<&'static str> {
    // Order matters: Chrome UAs also claim Safari.
    if ua.contains("Edg/") {
        Some("Edge")
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        Some("Opera")
    } else if ua.contains("Firefox/") {
        Some("Firefox")
    } else if ua.contains("Chrome/") {
        Some("Chrome")
    } else if ua.contains("Safari/") {
        Some("Safari")
    } else {
        None
    }
}
