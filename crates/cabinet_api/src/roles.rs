use chrono::{DateTime, NaiveDate, NaiveDateTime};
use maud::{Markup, html};

pub fn status_badge(status: &str) -> Markup {
    if status == "Active" {
        html! { span class="badge badge-soft-success" { "Active" } }
    } else {
        html! { span class="badge badge-soft-danger" { "Inactive" } }
    }
}

pub fn status_badge_html(status: &str) -> String {
    status_badge(status).into_string()
}

pub fn format_role_date(created_at: Option<&str>) -> String {
    created_at
        .and_then(parse_date)
        .map(|date| date.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(stamp.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
