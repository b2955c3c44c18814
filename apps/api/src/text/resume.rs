//! Résumé uploads: text extraction and storage of the original file.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;
use uuid::Uuid;
use zip::ZipArchive;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResumeFormat {
    Pdf,
    Docx,
    PlainText,
}

impl ResumeFormat {
    /// Detects the format from the file extension, falling back to the MIME type.
    pub fn detect(file_name: &str, mime: Option<&str>) -> Self {
        let name = file_name.to_ascii_lowercase();
        let mime = mime.unwrap_or_default().to_ascii_lowercase();
        if name.ends_with(".pdf") || mime == "application/pdf" {
            ResumeFormat::Pdf
        } else if name.ends_with(".docx") || mime.contains("wordprocessingml") {
            ResumeFormat::Docx
        } else {
            ResumeFormat::PlainText
        }
    }
}

/// Extracts plain text from an uploaded résumé.
///
/// PDF and DOCX files that fail to parse are decoded as UTF-8 text instead.
/// Plain text is decoded as UTF-8 with invalid sequences dropped. Returns `None`
/// when nothing but whitespace remains.
pub fn extract_resume_text(format: ResumeFormat, bytes: &[u8]) -> Option<String> {
    let parsed = match format {
        ResumeFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| anyhow::anyhow!("PDF text extraction failed: {e}"))
            .map(Some),
        ResumeFormat::Docx => docx_text(bytes).map(Some),
        ResumeFormat::PlainText => Ok(None),
    };

    let text = match parsed {
        Ok(Some(text)) => text,
        Ok(None) => decode_utf8(bytes),
        Err(e) => {
            warn!("{e:#}; reading the upload as plain text");
            decode_utf8(bytes)
        }
    };

    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Runs [`extract_resume_text`] on the blocking pool. A panicking parser yields `None`.
pub async fn read_resume_text(format: ResumeFormat, bytes: Bytes) -> Option<String> {
    run_extraction(move || extract_resume_text(format, &bytes)).await
}

async fn run_extraction<F>(extract: F) -> Option<String>
where
    F: FnOnce() -> Option<String> + Send + 'static,
{
    match tokio::task::spawn_blocking(extract).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Résumé text extraction task failed: {e}");
            None
        }
    }
}

fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Paragraph text of a DOCX body, one line per paragraph.
fn docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("DOCX is not a zip archive")?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("DOCX has no word/document.xml")?
        .read_to_string(&mut xml)
        .context("Failed to read word/document.xml")?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event().context("Malformed word/document.xml")? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::Empty(e) if e.name().as_ref() == b"w:tab" => current.push('\t'),
            Event::Empty(e) if e.name().as_ref() == b"w:br" => current.push('\n'),
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}

/// Keeps ASCII alphanumerics plus `.`, `_` and `-`; never empty.
pub fn sanitize_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let safe = safe.trim_start_matches('.').to_string();
    if safe.is_empty() {
        "resume".to_string()
    } else {
        safe
    }
}

/// Writes the original upload to `{upload_dir}/{user_id}/{unix_ts}_{safe_name}`.
pub async fn save_upload(
    upload_dir: &Path,
    user_id: Uuid,
    original_name: &str,
    bytes: &[u8],
) -> Result<PathBuf> {
    let dir = upload_dir.join(user_id.to_string());
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", dir.display()))?;

    let file_name = format!(
        "{}_{}",
        chrono::Utc::now().timestamp(),
        sanitize_file_name(original_name)
    );
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write upload {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(ResumeFormat::detect("CV.PDF", None), ResumeFormat::Pdf);
        assert_eq!(
            ResumeFormat::detect("upload", Some("application/pdf")),
            ResumeFormat::Pdf
        );
        assert_eq!(ResumeFormat::detect("cv.docx", None), ResumeFormat::Docx);
        assert_eq!(
            ResumeFormat::detect("cv.txt", Some("text/plain")),
            ResumeFormat::PlainText
        );
    }

    #[test]
    fn test_plain_text_drops_invalid_utf8() {
        let bytes = b"Rust engineer\xff\xfe with 5 years";
        assert_eq!(
            extract_resume_text(ResumeFormat::PlainText, bytes).as_deref(),
            Some("Rust engineer with 5 years")
        );
    }

    #[test]
    fn test_blank_text_yields_none() {
        assert!(extract_resume_text(ResumeFormat::PlainText, b"   \n").is_none());
    }

    fn docx(document_xml: &str) -> Vec<u8> {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let bytes = docx(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>Ada Lovelace</w:t></w:r></w:p>
                <w:p><w:r><w:t xml:space="preserve">Rust &amp; </w:t></w:r><w:r><w:t>Python</w:t></w:r></w:p>
                <w:p><w:r><w:t>Skills</w:t><w:tab/><w:t>Go</w:t></w:r></w:p>
              </w:body>
            </w:document>"#,
        );
        assert_eq!(
            extract_resume_text(ResumeFormat::Docx, &bytes).as_deref(),
            Some("Ada Lovelace\nRust & Python\nSkills\tGo")
        );
    }

    #[test]
    fn test_unparsable_docx_falls_back_to_text() {
        assert_eq!(
            extract_resume_text(ResumeFormat::Docx, b"Plain notes saved as .docx").as_deref(),
            Some("Plain notes saved as .docx")
        );
    }

    #[test]
    fn test_unparsable_pdf_falls_back_to_text() {
        assert_eq!(
            extract_resume_text(ResumeFormat::Pdf, b"Rust engineer, not really a PDF").as_deref(),
            Some("Rust engineer, not really a PDF")
        );
    }

    #[tokio::test]
    async fn test_read_resume_text_off_the_executor() {
        let text = read_resume_text(ResumeFormat::PlainText, Bytes::from_static(b" Go developer ")).await;
        assert_eq!(text.as_deref(), Some("Go developer"));
    }

    #[tokio::test]
    async fn test_panicking_extraction_yields_none() {
        let text = run_extraction(|| panic!("malformed cross-reference table")).await;
        assert!(text.is_none());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("My CV (final).pdf"), "MyCVfinal.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_file_name("???"), "resume");
    }

    #[tokio::test]
    async fn test_save_upload_writes_under_user_dir() {
        let dir = tempfile::tempdir().unwrap();
        let user_id = Uuid::new_v4();
        let path = save_upload(dir.path(), user_id, "cv.txt", b"hello").await.unwrap();

        assert!(path.starts_with(dir.path().join(user_id.to_string())));
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with("_cv.txt")));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello");
    }
}
