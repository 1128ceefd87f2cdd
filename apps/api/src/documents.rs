//! CV text extraction from uploaded documents.
//!
//! PDFs go through `pdf-extract` and DOCX files through their `word/document.xml`
//! part, both on the blocking pool; everything else is read as (lossy) UTF-8
//! text. Extraction never fails the request: unreadable documents yield an
//! empty string and the caller's placeholder applies.

use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

const DOCX_BODY_PART: &str = "word/document.xml";

/// Extracts plain text from an uploaded CV.
pub async fn extract_cv_text(bytes: Vec<u8>, filename: &str) -> String {
    let filename = filename.to_lowercase();
    let text = if filename.ends_with(".pdf") {
        extract_blocking("PDF", move || {
            pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| anyhow::anyhow!("Failed to parse PDF: {e}"))
        })
        .await
    } else if filename.ends_with(".docx") {
        extract_blocking("DOCX", move || extract_docx(&bytes)).await
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };
    let text = text.trim().to_string();
    debug!("Extracted {} characters from {filename}", text.chars().count());
    text
}

async fn extract_blocking<F>(kind: &str, extract: F) -> String
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    // Parsers can panic on malformed input; the blocking task contains it.
    match tokio::task::spawn_blocking(extract).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Failed to extract {kind} CV: {e:#}");
            String::new()
        }
        Err(e) => {
            warn!("{kind} extraction task failed: {e}");
            String::new()
        }
    }
}

/// Paragraph text from a DOCX body, one paragraph per line.
fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("DOCX is not a zip archive")?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY_PART)
        .with_context(|| format!("DOCX has no {DOCX_BODY_PART}"))?
        .read_to_string(&mut xml)
        .context("Failed to read DOCX body")?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;
    loop {
        match reader.read_event().context("Malformed DOCX XML")? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                text.push_str(&t.unescape().context("Bad DOCX text escape")?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}
