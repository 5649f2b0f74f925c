//! Best-effort comic and chapter titles, sanitized for use as directory names.

use crate::scraper::error::ScraperError;
use crate::scraper::{parse_selector, sanitize_file_name};
use scraper::Html;

/// Text of the `index`-th element matching `selector`, trimmed; empty when missing.
fn nth_text(doc: &Html, selector: &str, index: usize) -> Result<String, ScraperError> {
    let sel = parse_selector(selector)?;
    Ok(doc
        .select(&sel)
        .nth(index)
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default())
}

/// `<title>` text with a trailing " - Site" part cut at the first separator.
fn page_title_without_suffix(doc: &Html) -> Result<String, ScraperError> {
    let title = nth_text(doc, "title", 0)?;
    Ok(match title.find(" - ") {
        Some(idx) if idx > 0 => title[..idx].trim().to_string(),
        _ => title,
    })
}

fn clean(title: &str) -> String {
    let t = title.trim().replace(['\n', '\t'], "");
    sanitize_file_name(&t)
}

/// Comic title from a TOC page: `.comic-name`, breadcrumb, `h1`, `.comic-title`, then `<title>`.
/// Empty means the caller picks a default name.
pub fn extract_comic_title(doc: &Html) -> Result<String, ScraperError> {
    let candidates: [(&str, usize); 4] = [
        (".comic-name", 0),
        (".crumbs a", 1),
        ("h1", 0),
        (".comic-title", 0),
    ];
    for (selector, index) in candidates {
        let t = nth_text(doc, selector, index)?;
        if !t.is_empty() {
            return Ok(clean(&t));
        }
    }
    Ok(clean(&page_title_without_suffix(doc)?))
}

/// Chapter title from a chapter page: `h1`, `.chapter-title`, then `<title>`.
/// Empty means the caller picks a default name.
pub fn extract_chapter_title(doc: &Html) -> Result<String, ScraperError> {
    for selector in ["h1", ".chapter-title"] {
        let t = nth_text(doc, selector, 0)?;
        if !t.is_empty() {
            return Ok(clean(&t));
        }
    }
    Ok(clean(&page_title_without_suffix(doc)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn comic_title_prefers_comic_name() {
        let d = doc(r#"<title>T - Site</title><h1>Heading</h1><span class="comic-name">秘密教学</span>"#);
        assert_eq!(extract_comic_title(&d).unwrap(), "秘密教学");
    }

    #[test]
    fn comic_title_uses_second_breadcrumb() {
        let d = doc(r#"<div class="crumbs"><a href="/">Home</a><a href="/book/1">My Comic</a></div><h1>Other</h1>"#);
        assert_eq!(extract_comic_title(&d).unwrap(), "My Comic");
    }

    #[test]
    fn comic_title_falls_back_to_page_title_without_suffix() {
        let d = doc(r#"<html><head><title>Great Comic - 92hm</title></head><body></body></html>"#);
        assert_eq!(extract_comic_title(&d).unwrap(), "Great Comic");
    }

    #[test]
    fn hyphenated_title_without_separator_is_kept() {
        let d = doc(r#"<title>Spider-Man</title>"#);
        assert_eq!(extract_chapter_title(&d).unwrap(), "Spider-Man");
    }

    #[test]
    fn chapter_title_from_h1_is_cleaned_and_sanitized() {
        let d = doc("<h1>\n\tChapter 3: The End?\n</h1>");
        assert_eq!(extract_chapter_title(&d).unwrap(), "Chapter 3_ The End_");
    }

    #[test]
    fn chapter_title_from_class_when_no_h1() {
        let d = doc(r#"<div class="chapter-title">第5话</div>"#);
        assert_eq!(extract_chapter_title(&d).unwrap(), "第5话");
    }

    #[test]
    fn whitespace_only_h1_falls_through() {
        let d = doc(r#"<h1>   </h1><div class="chapter-title">Real</div>"#);
        assert_eq!(extract_chapter_title(&d).unwrap(), "Real");
    }

    #[test]
    fn nothing_found_is_empty() {
        let d = doc("<html><body><p>x</p></body></html>");
        assert_eq!(extract_chapter_title(&d).unwrap(), "");
        assert_eq!(extract_comic_title(&d).unwrap(), "");
    }
}
