//! Chapter-link extraction from a comic's table-of-contents page.

use crate::model::ChapterInfo;
use crate::scraper::error::ScraperError;
use crate::scraper::parse_selector;
use scraper::Html;

const PRIMARY_SELECTOR: &str = "a[href*='/chapter/']";
const FALLBACK_SELECTOR: &str = ".chapter-item a";

/// Chapter id from an href such as `/chapter/16124`: the last `/` segment, if it is an integer.
fn chapter_id_from_href(href: &str) -> Option<&str> {
    if !href.contains("/chapter/") {
        return None;
    }
    let parts: Vec<&str> = href.split('/').collect();
    if parts.len() < 3 {
        return None;
    }
    let id = parts[parts.len() - 1];
    id.parse::<i64>().ok().map(|_| id)
}

fn collect_links(doc: &Html, selector: &str) -> Result<Vec<ChapterInfo>, ScraperError> {
    let sel = parse_selector(selector)?;
    let mut chapters: Vec<ChapterInfo> = Vec::new();
    for el in doc.select(&sel) {
        let Some(id) = el.value().attr("href").and_then(chapter_id_from_href) else {
            continue;
        };
        if chapters.iter().any(|c| c.id == id) {
            continue;
        }
        let text = el.text().collect::<String>();
        let title = match text.trim() {
            "" => format!("Chapter {}", id),
            t => t.to_string(),
        };
        chapters.push(ChapterInfo {
            id: id.to_string(),
            title,
        });
    }
    Ok(chapters)
}

/// Chapters in page order, unique by id (first occurrence wins).
/// The `.chapter-item a` selector is only consulted when the primary one finds nothing.
pub fn extract_chapter_links(doc: &Html) -> Result<Vec<ChapterInfo>, ScraperError> {
    let chapters = collect_links(doc, PRIMARY_SELECTOR)?;
    if !chapters.is_empty() {
        return Ok(chapters);
    }
    collect_links(doc, FALLBACK_SELECTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(html: &str) -> Vec<ChapterInfo> {
        extract_chapter_links(&Html::parse_document(html)).unwrap()
    }

    #[test]
    fn extracts_ids_and_titles_in_order() {
        let html = r#"<ul>
            <li><a href="/chapter/101"> First </a></li>
            <li><a href="https://www.92hm.life/chapter/102">Second</a></li>
        </ul>"#;
        let chapters = links(html);
        assert_eq!(
            chapters,
            vec![
                ChapterInfo { id: "101".into(), title: "First".into() },
                ChapterInfo { id: "102".into(), title: "Second".into() },
            ]
        );
    }

    #[test]
    fn duplicate_anchors_keep_first_occurrence() {
        let html = r#"
            <a href="/chapter/7">Start reading</a>
            <a href="/chapter/7">Chapter 7: Real title</a>
            <a href="/chapter/8">Eight</a>
            <a href="/chapter/7">again</a>"#;
        let chapters = links(html);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Start reading");
        assert_eq!(chapters[1].id, "8");
    }

    #[test]
    fn empty_text_gets_default_title() {
        let chapters = links(r#"<a href="/chapter/55"><img src="x.jpg"></a>"#);
        assert_eq!(chapters[0].title, "Chapter 55");
    }

    #[test]
    fn non_numeric_trailing_segment_is_ignored() {
        let html = r#"
            <a href="/chapter/abc">bad</a>
            <a href="/chapter/12/">trailing slash</a>
            <a href="/chapter/13">ok</a>"#;
        let chapters = links(html);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].id, "13");
    }

    #[test]
    fn fallback_selector_only_when_primary_empty() {
        // Primary finds nothing qualifying; fallback anchors still need /chapter/ and a numeric id.
        let html = r#"
            <a href="/chapter/x">not numeric</a>
            <div class="chapter-item"><a href="/comic/chapter/900">Fallback</a></div>"#;
        // The fallback anchor also matches the primary selector, so it is found by the primary pass.
        assert_eq!(links(html)[0].id, "900");

        let none = links(r#"<div class="chapter-item"><a href="/read/1">x</a></div>"#);
        assert!(none.is_empty());
    }

    #[test]
    fn chapter_id_from_href_rules() {
        assert_eq!(chapter_id_from_href("/chapter/16124"), Some("16124"));
        assert_eq!(chapter_id_from_href("/chapter/"), None);
        assert_eq!(chapter_id_from_href("/book/418"), None);
        assert_eq!(chapter_id_from_href("https://h/chapter/3"), Some("3"));
    }
}
