//! HTML pages for both front-ends.

use axum::response::Html;

use crate::gateway::Video;

/// What the index page offers, depending on variant and session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Client-credentials front-end: videos are always reachable.
    Service,
    SignedOut,
    SignedIn,
}

pub fn index(nav: Navigation) -> Html<String> {
    let links = match nav {
        Navigation::Service => r#"<a class="btn" href="/videos">Browse videos</a>"#,
        Navigation::SignedOut => r#"<a class="btn" href="/login">Log in with Ingest</a>"#,
        Navigation::SignedIn => {
            r#"<a class="btn" href="/videos">Browse videos</a> <a href="/logout">Log out</a>"#
        }
    };
    Html(layout(
        "Ingest Videos",
        &format!("<h1>Ingest Videos</h1>\n<p>{links}</p>"),
    ))
}

pub fn video_list(videos: &[Video]) -> Html<String> {
    let items: String = if videos.is_empty() {
        "<p>No published or scheduled videos.</p>".to_string()
    } else {
        let rows: Vec<String> = videos
            .iter()
            .map(|video| {
                format!(
                    r#"<li><a href="/videos/{id}">{title}</a>{status}</li>"#,
                    id = escape(&urlencoding::encode(&video.id)),
                    title = escape(video.title.as_deref().unwrap_or(&video.id)),
                    status = video
                        .status
                        .as_deref()
                        .map(|s| format!(" <small>{}</small>", escape(s)))
                        .unwrap_or_default(),
                )
            })
            .collect();
        format!("<ul>\n{}\n</ul>", rows.join("\n"))
    };
    Html(layout(
        "Videos",
        &format!("<h1>Videos</h1>\n{items}\n<p><a href=\"/\">Home</a></p>"),
    ))
}

pub fn video_page(video: &Video, play_url: &str) -> Html<String> {
    let title = escape(video.title.as_deref().unwrap_or(&video.id));
    let player = if play_url.is_empty() {
        "<p>This video has no playable targets yet.</p>".to_string()
    } else {
        let poster = video
            .thumbnail_url
            .as_deref()
            .map(|url| format!(r#" poster="{}""#, escape(url)))
            .unwrap_or_default();
        format!(
            r#"<video controls width="720"{poster} src="{src}"></video>"#,
            src = escape(play_url)
        )
    };
    let description = video
        .description
        .as_deref()
        .map(|d| format!("<p>{}</p>", escape(d)))
        .unwrap_or_default();
    Html(layout(
        &title,
        &format!(
            "<h1>{title}</h1>\n{player}\n{description}\n<p><a href=\"/videos\">All videos</a></p>"
        ),
    ))
}

pub fn failure(heading: &str, message: &str) -> Html<String> {
    Html(layout(
        heading,
        &format!(
            "<h1>{}</h1>\n<p class=\"error\">{}</p>\n<p><a href=\"/\">Home</a></p>",
            escape(heading),
            escape(message)
        ),
    ))
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 2rem auto; max-width: 760px; }}
        .btn {{ background: #667eea; color: white; padding: 0.5rem 1.5rem; border-radius: 0.5rem; text-decoration: none; }}
        .error {{ background: #fff5f5; border: 1px solid #feb2b2; color: #c53030; padding: 1rem; border-radius: 0.5rem; }}
    </style>
</head>
<body>
{body}
</body>
</html>
"#
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
