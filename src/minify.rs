use minify_html::{Cfg, minify};

/// Minifies the composed page. Closing tags and the html/head opening tags
/// are kept so the document survives strict parsers; inline CSS and JS are
/// minified along with the markup.
pub fn minify_document(html: String) -> String {
    let cfg = Cfg {
        minify_css: true,
        minify_js: true,
        keep_closing_tags: true,
        keep_html_and_head_opening_tags: true,
        ..Default::default()
    };
    let min = minify(html.as_bytes(), &cfg);
    String::from_utf8(min).unwrap_or(html)
}
