use crate::report::{BossReport, Chance};
use crate::slug;

const WIKI_BASE: &str = "https://tibia.fandom.com/wiki/";
const IMAGE_DIR: &str = "_img/";

pub const KILLED_HEADING: &str = "Recently killed bosses";
pub const CHECK_HEADING: &str = "Bosses to check";

/// Renders the report body: the recently-killed table (when any boss is
/// killed), then the bosses-to-check table (when any is pending), then the
/// last-updated footer. The fragment replaces the data token in the page
/// template.
pub fn render_report(rep: &BossReport) -> String {
    let mut check = String::new();
    let mut killed = String::new();
    for boss in &rep.bosses {
        let slugs = slug::derive(&boss.name);
        if boss.killed {
            killed.push_str(&format!(
                "<tr><td><a href=\"{WIKI_BASE}{}\"><img src=\"{IMAGE_DIR}{}.webp\" width=\"64\" height=\"64\" decoding=\"async\" alt=\"\"> {} (killed)</a></td><td><s>{}</s></td></tr>",
                slugs.wiki, slugs.image, html_escape(&slugs.display), chance_label(boss.chance)
            ));
        } else {
            check.push_str(&format!(
                "<tr><td><a href=\"{WIKI_BASE}{}\"><img src=\"{IMAGE_DIR}{}.webp\" width=\"64\" height=\"64\" decoding=\"async\" alt=\"\"> {}</a></td><td>{}</td></tr>",
                slugs.wiki, slugs.image, html_escape(&slugs.display), chance_label(boss.chance)
            ));
        }
    }
    let mut s = String::new();
    if !killed.is_empty() { push_table(&mut s, KILLED_HEADING, &killed); }
    if !check.is_empty() { push_table(&mut s, CHECK_HEADING, &check); }
    s.push_str(&format!("<p>Last updated on <time>{}</time>.</p>", html_escape(&rep.timestamp)));
    s
}

fn push_table(s: &mut String, heading: &str, rows: &str) {
    s.push_str(&format!("<h2>{heading}</h2><div class=\"table-wrapper\"><table><thead><tr><th>Boss</th><th>Confidence</th></tr></thead><tbody>"));
    s.push_str(rows);
    s.push_str("</tbody></table></div>");
}

/// Cell text for a chance value; killed bosses may have none left.
pub fn chance_label(chance: Chance) -> String {
    match chance {
        Chance::Known(v) => format_percent(v),
        Chance::Unknown => "?".to_string(),
    }
}

pub fn format_percent(v: f64) -> String {
    format!("{v:.2}%")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
