pub fn normalize_route(route: &str) -> String {
    if route.starts_with('/') {
        route.to_string()
    } else {
        format!("/{route}")
    }
}

// The base is only stripped when it is a whole leading segment, so
// `/application` stays as is under `/app`. The result always starts with `/`.
pub fn route_from_pathname(pathname: &str, base_path: &str) -> String {
    let rest = match pathname.strip_prefix(base_path) {
        Some(rest) if !base_path.is_empty() && (rest.is_empty() || rest.starts_with('/')) => rest,
        _ => pathname,
    };
    if rest.is_empty() {
        "/".to_string()
    } else {
        normalize_route(rest)
    }
}
