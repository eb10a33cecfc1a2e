/// Derives the "OS family - browser family" description stored with a login
/// session. Recomputed on every login and overwrites the previous value, so
/// a stale description self-heals.
pub fn describe_device(user_agent: &str) -> String {
    format!("{} - {}", os_family(user_agent), browser_family(user_agent))
}

fn os_family(ua: &str) -> &'static str {
    if ua.contains("iPhone") {
        "iPhone"
    } else if ua.contains("iPad") {
        "iPad"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("Mac OS") || ua.contains("Macintosh") {
        "Mac"
    } else if ua.contains("Linux") {
        "Linux"
    } else {
        "Unknown"
    }
}

fn browser_family(ua: &str) -> &'static str {
    // Order matters: Edge and Opera UAs also contain "Chrome", and every
    // WebKit browser contains "Safari".
    if ua.contains("Edg/") || ua.contains("Edge/") {
        "Edge"
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        "Opera"
    } else if ua.contains("Firefox/") {
        "Firefox"
    } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
        "Chrome"
    } else if ua.contains("Safari/") {
        "Safari"
    } else {
        "Unknown"
    }
}
