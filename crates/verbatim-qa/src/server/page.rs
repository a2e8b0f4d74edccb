//! Server-rendered HTML for the front-end page

use pulldown_cmark::{html, Event, Options, Parser};
use std::fmt::Write;
use std::path::Path;

use crate::session::{ChatHistory, Role};
use crate::types::StoredFile;

use super::state::{Notice, NoticeLevel};

/// Everything the page shows
pub struct PageView<'a> {
    pub docs_dir: &'a Path,
    pub db_path: &'a Path,
    pub index_exists: bool,
    pub documents: &'a [StoredFile],
    pub notices: &'a [Notice],
    pub history: &'a ChatHistory,
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; color: #1f2328; }
h1 { margin-bottom: .25rem; }
.caption { color: #656d76; font-size: .9rem; margin: .15rem 0; }
section { margin: 1.5rem 0; }
form { margin: .5rem 0; }
.notice { padding: .6rem .8rem; border-radius: 6px; margin: .5rem 0; }
.success { background: #dafbe1; }
.warning { background: #fff8c5; }
.error { background: #ffebe9; }
pre { background: #f6f8fa; padding: .6rem; overflow-x: auto; white-space: pre-wrap; }
.turn { border-top: 1px solid #d0d7de; padding: .4rem 0; }
input[type=text] { width: 70%; padding: .35rem; }
"#;

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Render markdown; raw HTML in the input is shown as text, line breaks are kept
pub fn markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn notice_html(out: &mut String, notice: &Notice) {
    let class = match notice.level {
        NoticeLevel::Success => "success",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    let _ = write!(out, r#"<div class="notice {}">{}"#, class, escape(&notice.message));
    if let Some(detail) = &notice.detail {
        let _ = write!(out, "<pre><code>{}</code></pre>", escape(detail));
    }
    out.push_str("</div>\n");
}

/// Render the whole page
pub fn render(view: &PageView<'_>) -> String {
    let mut out = String::new();

    let _ = write!(
        out,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Verbatim RAG</title>
<style>{style}</style>
</head>
<body>
<h1>Verbatim RAG – PDF Q&amp;A</h1>
<p class="caption">Docs folder: {docs}</p>
<p class="caption">Index: {db} ({status})</p>
"#,
        style = STYLE,
        docs = escape(&view.docs_dir.display().to_string()),
        db = escape(&view.db_path.display().to_string()),
        status = if view.index_exists { "exists" } else { "new will be created on build" },
    );

    for notice in view.notices {
        notice_html(&mut out, notice);
    }

    out.push_str(
        r#"<section>
<h2>Documents</h2>
<form method="post" action="/upload" enctype="multipart/form-data">
<input type="file" name="files" accept=".pdf,application/pdf" multiple>
<button type="submit">Save PDFs to folder</button>
</form>
<form method="post" action="/build">
<button type="submit">Build / Update index</button>
</form>
"#,
    );

    if view.documents.is_empty() {
        out.push_str("<p class=\"caption\">No PDFs saved yet.</p>\n");
    } else {
        out.push_str("<ul>\n");
        for doc in view.documents {
            let _ = writeln!(
                out,
                "<li>{} <span class=\"caption\">({} KB)</span></li>",
                escape(&doc.filename),
                doc.size.div_ceil(1024)
            );
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</section>\n");

    out.push_str(
        r#"<section>
<h2>Ask</h2>
<form method="post" action="/ask">
<input type="text" name="question" placeholder="Ask a question about your PDFs" autofocus>
<button type="submit">Ask</button>
</form>
</section>
"#,
    );

    if !view.history.is_empty() {
        out.push_str(
            "<section>\n<h2>History</h2>\n\
             <form method=\"post\" action=\"/clear\"><button type=\"submit\">Clear history</button></form>\n",
        );
        for turn in view.history.recent_first() {
            let body = match turn.role {
                Role::User => markdown(&format!("**You:** {}", turn.content)),
                Role::Assistant => markdown(&turn.content),
            };
            let _ = writeln!(out, "<div class=\"turn\">{}</div>", body);
        }
        out.push_str("</section>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view<'a>(history: &'a ChatHistory, notices: &'a [Notice], exists: bool) -> PageView<'a> {
        PageView {
            docs_dir: Path::new("/data/doc"),
            db_path: Path::new("/data/index.db"),
            index_exists: exists,
            documents: &[],
            notices,
            history,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_markdown_neutralizes_raw_html() {
        let html = markdown("**bold** <script>alert(1)</script>");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_markdown_keeps_line_breaks() {
        let html = markdown("first\nsecond");
        assert!(html.contains("<br />"));
    }

    #[test]
    fn test_status_caption() {
        let history = ChatHistory::new();
        assert!(render(&view(&history, &[], false)).contains("(new will be created on build)"));
        assert!(render(&view(&history, &[], true)).contains("(exists)"));
    }

    #[test]
    fn test_history_most_recent_first() {
        let mut history = ChatHistory::new();
        history.push_user("first question");
        history.push_assistant("first answer");
        history.push_user("second question");

        let page = render(&view(&history, &[], true));
        let second = page.find("second question").unwrap();
        let answer = page.find("first answer").unwrap();
        let first = page.find("first question").unwrap();

        assert!(second < answer && answer < first);
        assert!(page.contains("<strong>You:</strong> second question"));
    }

    #[test]
    fn test_error_notice_shows_trace() {
        let history = ChatHistory::new();
        let notices = vec![Notice::error("Index build failed.", "No PDFs found in <dir>")];
        let page = render(&view(&history, &notices, false));

        assert!(page.contains("Index build failed."));
        assert!(page.contains("<pre><code>No PDFs found in &lt;dir&gt;</code></pre>"));
    }
}
