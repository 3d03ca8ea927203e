use anyhow::{anyhow, Context, Result};
use tracing::debug;

const PDF_SIGNATURE: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStats {
    pub chars: usize,
    pub words: usize,
    pub lines: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            chars: text.chars().count(),
            words: text.split_whitespace().count(),
            lines: text.lines().count(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{}, {}, {}",
            count_label(self.chars, "character", "characters"),
            count_label(self.words, "word", "words"),
            count_label(self.lines, "line", "lines")
        )
    }
}

fn count_label(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}

/// Extracts the text layer of a PDF. The parser is CPU-bound and may panic on
/// malformed input, so it runs on the blocking pool.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String> {
    if !is_pdf(&bytes) {
        return Err(anyhow!("File is not a PDF document"));
    }

    let size = bytes.len();
    let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .context("PDF parser crashed")?
        .map_err(|err| anyhow!("Failed to parse PDF: {:?}", err))?;

    let text = normalize_text(&raw);
    debug!(size, chars = text.len(), "Extracted PDF text");

    if text.is_empty() {
        return Err(anyhow!("PDF contains no extractable text"));
    }

    Ok(text)
}

pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0usize;

    for line in raw.replace("\r\n", "\n").split('\n') {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(!is_pdf(b"PK\x03\x04"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn test_normalize_collapses_blank_lines() {
        let raw = "\n\nTitle  \r\n\r\n\r\n\r\nBody line one\nBody line two\t\n\n\n";
        assert_eq!(normalize_text(raw), "Title\n\nBody line one\nBody line two");
    }

    #[test]
    fn test_normalize_whitespace_only() {
        assert_eq!(normalize_text(" \n\t\n  "), "");
    }

    #[test]
    fn test_text_stats() {
        let stats = TextStats::of("one two\nthree");
        assert_eq!(stats, TextStats { chars: 13, words: 3, lines: 2 });
    }

    #[test]
    fn test_summary_pluralises() {
        assert_eq!(TextStats::of("word").summary(), "4 characters, 1 word, 1 line");
        assert_eq!(TextStats::of("a\nb c").summary(), "5 characters, 3 words, 2 lines");
        assert_eq!(
            TextStats { chars: 1, words: 0, lines: 0 }.summary(),
            "1 character, 0 words, 0 lines"
        );
    }

    #[tokio::test]
    async fn test_extract_rejects_non_pdf() {
        let err = extract_text(b"hello world".to_vec()).await.unwrap_err();
        assert!(err.to_string().contains("not a PDF"));
    }

    #[tokio::test]
    async fn test_extract_rejects_truncated_pdf() {
        assert!(extract_text(b"%PDF-1.4\n%garbage".to_vec()).await.is_err());
    }
}
