//! Static documents served by the edge: the home page and the visit badge.

pub const HOME_PAGE: &str = include_str!("../assets/home.html");

pub fn home_page() -> &'static str {
    HOME_PAGE
}

pub trait BadgeRenderer: Send + Sync {
    fn render(&self, count: u64) -> String;
}

/// Two-segment flat badge, `label | count`.
#[derive(Debug, Clone)]
pub struct FlatBadge {
    label: String,
}

const CHAR_WIDTH: usize = 7;
const PADDING: usize = 10;

impl FlatBadge {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    fn segment_width(text: &str) -> usize {
        text.chars().count() * CHAR_WIDTH + PADDING
    }
}

impl Default for FlatBadge {
    fn default() -> Self {
        Self::new("visits")
    }
}

impl BadgeRenderer for FlatBadge {
    fn render(&self, count: u64) -> String {
        let value = count.to_string();
        let label_width = Self::segment_width(&self.label);
        let value_width = Self::segment_width(&value);
        let width = label_width + value_width;

        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="20" role="img" aria-label="{label}: {value}"><title>{label}: {value}</title><rect width="{label_width}" height="20" fill="#555"/><rect x="{label_width}" width="{value_width}" height="20" fill="#4c1"/><g fill="#fff" text-anchor="middle" font-family="Verdana,Geneva,DejaVu Sans,sans-serif" font-size="11"><text x="{label_x}" y="14">{label}</text><text x="{value_x}" y="14">{value}</text></g></svg>"##,
            label = escape(&self.label),
            label_x = label_width / 2,
            value_x = label_width + value_width / 2,
        )
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
