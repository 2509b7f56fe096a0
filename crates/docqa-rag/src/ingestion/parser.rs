//! File loader producing page-level text units

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Parsed document with page-level text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Page-level content, in document order
    pub pages: Vec<PageContent>,
    /// Hex SHA-256 of the raw bytes
    pub content_hash: String,
}

impl ParsedDocument {
    /// Full text, pages joined by newlines
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when no page carries any non-whitespace text
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.content.trim().is_empty())
    }
}

/// Content from a single page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Text content of the page
    pub content: String,
}

/// File parser for paginated PDFs and UTF-8 text
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        match FileType::from_filename(filename) {
            FileType::Pdf => Self::parse_pdf(filename, data),
            file_type => Self::parse_text(filename, data, file_type),
        }
    }

    /// Parse a PDF into one unit per page
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let pages = match Self::extract_pdf_pages(data) {
            Ok(pages) if pages.iter().any(|p| !p.content.trim().is_empty()) => pages,
            Ok(_) | Err(_) => {
                // Some PDFs carry fonts lopdf cannot decode; pdf-extract handles more of them
                // but only yields whole-document text
                tracing::debug!("Per-page extraction failed for {}, using pdf-extract", filename);
                let content = pdf_extract::extract_text_from_mem(data)
                    .map_err(|e| Error::file_parse(filename, e.to_string()))?;
                vec![PageContent {
                    page_number: 1,
                    content,
                }]
            }
        };

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            pages,
            content_hash: hash_content(data),
        })
    }

    fn extract_pdf_pages(data: &[u8]) -> std::result::Result<Vec<PageContent>, lopdf::Error> {
        let doc = lopdf::Document::load_mem(data)?;
        let mut pages = Vec::new();

        for page_number in doc.get_pages().keys() {
            let content = doc.extract_text(&[*page_number])?;
            pages.push(PageContent {
                page_number: *page_number,
                content,
            });
        }

        Ok(pages)
    }

    /// Parse a UTF-8 text file as a single page
    fn parse_text(filename: &str, data: &[u8], file_type: FileType) -> Result<ParsedDocument> {
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::file_parse(filename, format!("not valid UTF-8 text: {}", e)))?
            .to_string();

        Ok(ParsedDocument {
            file_type,
            pages: vec![PageContent {
                page_number: 1,
                content,
            }],
            content_hash: hash_content(data),
        })
    }
}

/// Hex SHA-256 of raw bytes
pub fn hash_content(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
