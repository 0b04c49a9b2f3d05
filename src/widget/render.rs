use std::fmt::Write as _;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the gallery fragment: linked thumbnails (or an empty-state line)
/// followed by the refresh button.
pub fn render_gallery(urls: &[String], loading: bool) -> String {
    let mut html = String::from("<div class=\"image-gallery\">\n");

    if urls.is_empty() {
        let message = if loading { "Loading..." } else { "No images" };
        let _ = writeln!(html, "  <div class=\"image-gallery-empty\">{message}</div>");
    } else {
        html.push_str("  <div class=\"image-gallery-items\">\n");
        for (i, url) in urls.iter().enumerate() {
            let url = escape(url);
            let _ = writeln!(
                html,
                "    <a href=\"{url}\" target=\"_blank\" rel=\"noreferrer\"><img src=\"{url}\" alt=\"img-{i}\"></a>"
            );
        }
        html.push_str("  </div>\n");
    }

    let (label, disabled) = if loading {
        ("Refreshing...", " disabled")
    } else {
        ("Refresh images", "")
    };
    let _ = writeln!(html, "  <button type=\"button\"{disabled}>{label}</button>");
    html.push_str("</div>\n");
    html
}
