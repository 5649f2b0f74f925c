//! Ebook builder: a comic directory of `NNN_<title>` chapter directories becomes one CBZ with
//! `comic.json`, `toc.html`, and every chapter's images under `<chapter dir>/`.

use super::{add_file, base_name, create_archive, list_images, ArchiveError};
use crate::model::{Chapter, ComicInfo};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;

const COMIC_JSON: &str = "comic.json";
const TOC_HTML: &str = "toc.html";

/// Result of building one ebook archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EbookReport {
    pub output: PathBuf,
    pub chapters: usize,
    pub pages: usize,
}

/// Split a chapter directory name at its first `_` into (id without leading zeros, title).
/// Names without `_` use the whole name for both.
fn split_dir_name(name: &str) -> (String, String) {
    match name.split_once('_') {
        Some((id, title)) => (id.trim_start_matches('0').to_string(), title.to_string()),
        None => (name.to_string(), name.to_string()),
    }
}

/// Scan `comic_dir`: title from the directory name, one [Chapter] per subdirectory in name order,
/// with `start_page` counting pages across all earlier chapters.
pub fn read_comic_info(comic_dir: &Path) -> Result<ComicInfo, ArchiveError> {
    if !comic_dir.is_dir() {
        return Err(ArchiveError::NotADirectory(comic_dir.to_path_buf()));
    }
    let title = base_name(comic_dir)
        .ok_or_else(|| ArchiveError::NotADirectory(comic_dir.to_path_buf()))?;

    let read_err = |e| ArchiveError::ReadDir {
        path: comic_dir.to_path_buf(),
        source: e,
    };
    let mut dir_names = Vec::new();
    for entry in std::fs::read_dir(comic_dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => dir_names.push(name),
            Err(name) => warn!("skipping non-UTF-8 directory {:?}", name),
        }
    }
    dir_names.sort();

    let mut chapters = Vec::with_capacity(dir_names.len());
    let mut next_page = 1;
    for dir_name in dir_names {
        let images = match list_images(&comic_dir.join(&dir_name)) {
            Ok(images) => images,
            Err(e) => {
                warn!("skipping chapter {}: {}", dir_name, e);
                continue;
            }
        };
        let (id, chapter_title) = split_dir_name(&dir_name);
        debug!("chapter {} ({} pages from {})", dir_name, images.len(), next_page);
        chapters.push(Chapter {
            id,
            title: chapter_title,
            image_count: images.len(),
            start_page: next_page,
            first_image: images.first().cloned(),
            dir_name,
        });
        next_page += images.len();
    }

    Ok(ComicInfo { title, chapters })
}

/// `<comic dir>.cbz` next to the comic directory.
pub fn default_output(comic_dir: &Path) -> Option<PathBuf> {
    let dir = match comic_dir.file_name() {
        Some(_) => comic_dir.to_path_buf(),
        None => comic_dir.canonicalize().ok()?,
    };
    let name = dir.file_name()?.to_string_lossy().into_owned();
    Some(dir.with_file_name(format!("{}.cbz", name)))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Static HTML table of contents. Each chapter links to its first image inside the archive.
pub fn render_toc(info: &ComicInfo) -> String {
    let title = html_escape(&info.title);
    let mut items = String::new();
    for ch in &info.chapters {
        let name = html_escape(&ch.title);
        let link = match &ch.first_image {
            Some(first) => format!(
                r#"<a href="{}/{}">{}</a>"#,
                html_escape(&ch.dir_name),
                html_escape(first),
                name
            ),
            None => name,
        };
        let pages = match ch.end_page() {
            Some(end) if end > ch.start_page => format!(
                "pages {}-{} ({} pages)",
                ch.start_page, end, ch.image_count
            ),
            Some(_) => format!("page {} (1 page)", ch.start_page),
            None => "no pages".to_string(),
        };
        items.push_str(&format!(
            "    <li>\n      {}\n      <div class=\"chapter-info\">{}</div>\n    </li>\n",
            link, pages
        ));
    }
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <title>{title} - Contents</title>
  <style>
    body {{ font-family: Arial, sans-serif; margin: 40px; }}
    ul {{ list-style-type: none; padding: 0; }}
    li {{ margin: 10px 0; padding: 10px; border: 1px solid #ddd; border-radius: 5px; }}
    a {{ text-decoration: none; color: #007bff; }}
    .chapter-info {{ color: #666; font-size: 0.9em; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <h2>Contents</h2>
  <ul>
{items}  </ul>
</body>
</html>
"#,
        title = title,
        items = items
    )
}

/// Build the ebook archive for `comic_dir` at `output` (default [default_output]).
///
/// Entry order: `comic.json`, `toc.html`, then each chapter's images in reading order.
pub fn write_ebook(comic_dir: &Path, output: Option<&Path>) -> Result<EbookReport, ArchiveError> {
    let info = read_comic_info(comic_dir)?;
    let output = match output {
        Some(p) => p.to_path_buf(),
        None => default_output(comic_dir)
            .ok_or_else(|| ArchiveError::NotADirectory(comic_dir.to_path_buf()))?,
    };

    let mut zip = create_archive(&output)?;
    let options_deflate =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(COMIC_JSON, options_deflate)?;
    zip.write_all(&serde_json::to_vec_pretty(&info)?)?;

    zip.start_file(TOC_HTML, options_deflate)?;
    zip.write_all(render_toc(&info).as_bytes())?;

    let mut pages = 0;
    for ch in &info.chapters {
        let chapter_dir = comic_dir.join(&ch.dir_name);
        for image in list_images(&chapter_dir)? {
            add_file(
                &mut zip,
                &chapter_dir.join(&image),
                &format!("{}/{}", ch.dir_name, image),
            )?;
            pages += 1;
        }
    }
    zip.finish()?;

    Ok(EbookReport {
        output,
        chapters: info.chapters.len(),
        pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fs::File;
    use std::io::Read;
    use zip::ZipArchive;

    fn make_comic(root: &Path) -> std::io::Result<PathBuf> {
        let comic = root.join("秘密教学");
        let chapters: [(&str, &[&str]); 4] = [
            ("002_Ep <2>", &["0001.jpg", "0002.jpg", "0003.jpg"]),
            ("001_Ep 1", &["0002.jpg", "0001.jpg"]),
            ("003_Extra", &[]),
            ("Special", &["a.png"]),
        ];
        for (dir, files) in chapters {
            let d = comic.join(dir);
            std::fs::create_dir_all(&d)?;
            for f in files {
                std::fs::write(d.join(f), dir.as_bytes())?;
            }
        }
        std::fs::write(comic.join("notes.txt"), b"not a chapter")?;
        Ok(comic)
    }

    #[test]
    fn split_dir_name_rules() {
        assert_eq!(split_dir_name("001_Ep 1"), ("1".into(), "Ep 1".into()));
        assert_eq!(split_dir_name("010_A_B"), ("10".into(), "A_B".into()));
        assert_eq!(split_dir_name("Special"), ("Special".into(), "Special".into()));
        assert_eq!(split_dir_name("000_Zero"), ("".into(), "Zero".into()));
    }

    #[test]
    fn comic_info_has_running_start_pages() -> Result<(), Box<dyn Error>> {
        let work = tempfile::tempdir()?;
        let comic = make_comic(work.path())?;
        let info = read_comic_info(&comic)?;
        assert_eq!(info.title, "秘密教学");
        let summary: Vec<(&str, &str, usize, usize)> = info
            .chapters
            .iter()
            .map(|c| (c.dir_name.as_str(), c.id.as_str(), c.image_count, c.start_page))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("001_Ep 1", "1", 2, 1),
                ("002_Ep <2>", "2", 3, 3),
                ("003_Extra", "3", 0, 6),
                ("Special", "Special", 1, 6),
            ]
        );
        assert_eq!(info.chapters[0].first_image.as_deref(), Some("0001.jpg"));
        assert_eq!(info.chapters[2].first_image, None);
        Ok(())
    }

    #[test]
    fn read_comic_info_rejects_missing_dir() {
        let result = read_comic_info(Path::new("/nonexistent_comicbox_comic"));
        assert!(matches!(result, Err(ArchiveError::NotADirectory(_))));
    }

    #[test]
    fn toc_links_first_images_and_escapes() -> Result<(), Box<dyn Error>> {
        let work = tempfile::tempdir()?;
        let info = read_comic_info(&make_comic(work.path())?)?;
        let toc = render_toc(&info);
        assert!(toc.contains(r#"<a href="001_Ep 1/0001.jpg">Ep 1</a>"#));
        assert!(toc.contains(r#"<a href="002_Ep &lt;2&gt;/0001.jpg">Ep &lt;2&gt;</a>"#));
        assert!(toc.contains("pages 3-5 (3 pages)"));
        assert!(toc.contains("page 6 (1 page)"));
        assert!(toc.contains("no pages"));
        assert!(!toc.contains("<2>"));
        Ok(())
    }

    #[test]
    fn ebook_writes_metadata_first_then_images() -> Result<(), Box<dyn Error>> {
        let work = tempfile::tempdir()?;
        let comic = make_comic(work.path())?;

        let report = write_ebook(&comic, None)?;
        assert_eq!(report.output, work.path().join("秘密教学.cbz"));
        assert_eq!(report.chapters, 4);
        assert_eq!(report.pages, 6);

        let mut zip = ZipArchive::new(File::open(&report.output)?)?;
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).map(|f| f.name().to_string()))
            .collect::<Result<_, _>>()?;
        assert_eq!(
            names,
            vec![
                "comic.json",
                "toc.html",
                "001_Ep 1/0001.jpg",
                "001_Ep 1/0002.jpg",
                "002_Ep <2>/0001.jpg",
                "002_Ep <2>/0002.jpg",
                "002_Ep <2>/0003.jpg",
                "Special/a.png",
            ]
        );

        let mut json = String::new();
        zip.by_name("comic.json")?.read_to_string(&mut json)?;
        let v: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(v["title"], "秘密教学");
        assert_eq!(v["chapters"][1]["start_page"], 3);
        assert_eq!(v["chapters"][2]["image_count"], 0);
        assert!(json.contains("\n  \"chapters\""));
        Ok(())
    }

    #[test]
    fn ebook_honors_explicit_output() -> Result<(), Box<dyn Error>> {
        let work = tempfile::tempdir()?;
        let comic = make_comic(work.path())?;
        let out = work.path().join("book.cbz");
        let report = write_ebook(&comic, Some(&out))?;
        assert_eq!(report.output, out);
        assert!(out.exists());
        Ok(())
    }

    #[test]
    fn default_output_sits_next_to_directory() {
        assert_eq!(
            default_output(Path::new("comics/My Comic")),
            Some(PathBuf::from("comics/My Comic.cbz"))
        );
        assert_eq!(
            default_output(Path::new("My Comic/")),
            Some(PathBuf::from("My Comic.cbz"))
        );
    }
}
