//! Small HTML helpers shared by the page handlers.

use axum::response::Html;

/// Escape text for safe inclusion in HTML element content and attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Wrap `body` (already-escaped HTML) in the common page layout.
pub fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n\
         <nav><a href=\"/viewbooks\">My books</a> | <a href=\"/newbook\">Add book</a> | \
         <a href=\"/viewgenres\">Genres</a> | <a href=\"/newgenre\">Add genre</a> | \
         <a href=\"/login\">Log in</a> | <a href=\"/signUp\">Sign up</a></nav>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    ))
}

/// A single status line shown above a form.
pub fn message(text: &str) -> String {
    format!("<p class=\"message\">{}</p>", escape(text))
}

/// List each problem on its own line.
pub fn problems<E: std::fmt::Display>(errors: &[E]) -> String {
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape(&e.to_string())))
        .collect();
    format!("<ul class=\"errors\">{items}</ul>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralises_markup() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape("%$£^*(l %^()"), "%$£^*(l %^()");
    }

    #[test]
    fn page_escapes_its_title() {
        let Html(body) = page("<Books>", "<p>ok</p>");
        assert!(body.contains("<h1>&lt;Books&gt;</h1>"));
        assert!(body.contains("<p>ok</p>"));
    }
}
