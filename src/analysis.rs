//! Content-type sniffing for display.
//!
//! Reads at most the first 512 bytes of a file and asks `infer` for a MIME
//! type, falling back to an extension table. The organizer never consults
//! this: matching is purely name-based.

use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Bytes inspected from the start of each file
pub const SNIFF_LEN: usize = 512;

/// Broad file category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Audio,
    Video,
    Document,
    Archive,
    Code,
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Document => "document",
            Category::Archive => "archive",
            Category::Code => "code",
            Category::Other => "other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Image => "🖼",
            Category::Audio => "🎵",
            Category::Video => "🎬",
            Category::Document => "📄",
            Category::Archive => "📦",
            Category::Code => "⌨",
            Category::Other => "·",
        }
    }

    /// Category for a MIME type like `image/png`
    pub fn from_mime(mime: &str) -> Option<Category> {
        let mime = mime.to_ascii_lowercase();
        let (top, sub) = mime.split_once('/')?;
        match top {
            "image" => Some(Category::Image),
            "audio" => Some(Category::Audio),
            "video" => Some(Category::Video),
            "text" => Some(Category::Document),
            "application" => match sub {
                "pdf" | "rtf" | "msword" | "epub+zip" => Some(Category::Document),
                s if s.contains("officedocument") || s.contains("opendocument") => {
                    Some(Category::Document)
                }
                "zip" | "gzip" | "x-tar" | "x-bzip2" | "x-xz" | "x-7z-compressed"
                | "vnd.rar" | "zstd" => Some(Category::Archive),
                _ => None,
            },
            _ => None,
        }
    }

    /// Category for an extension (case-insensitive, without the dot)
    pub fn from_extension(ext: &str) -> Option<Category> {
        let ext = ext.to_ascii_lowercase();
        let category = match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "svg" | "heic" | "tiff" => {
                Category::Image
            }
            "mp3" | "wav" | "flac" | "ogg" | "m4a" | "aac" | "opus" => Category::Audio,
            "mp4" | "mkv" | "avi" | "mov" | "webm" | "wmv" => Category::Video,
            "pdf" | "doc" | "docx" | "odt" | "txt" | "md" | "rtf" | "epub" | "csv" | "xlsx"
            | "pptx" => Category::Document,
            "zip" | "tar" | "gz" | "bz2" | "xz" | "7z" | "rar" | "zst" => Category::Archive,
            "rs" | "py" | "js" | "ts" | "go" | "c" | "h" | "cpp" | "java" | "sh" | "toml"
            | "json" | "yaml" | "yml" => Category::Code,
            _ => return None,
        };
        Some(category)
    }
}

/// Advisory content type of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileKind {
    /// MIME type detected from the leading bytes, if any
    pub mime: Option<String>,
    pub category: Category,
}

/// Classify raw leading bytes plus an optional extension
pub fn classify(head: &[u8], extension: Option<&str>) -> FileKind {
    let head = &head[..head.len().min(SNIFF_LEN)];
    let mime = infer::get(head).map(|t| t.mime_type().to_string());

    let category = mime
        .as_deref()
        .and_then(Category::from_mime)
        .or_else(|| extension.and_then(Category::from_extension))
        .unwrap_or(Category::Other);

    FileKind { mime, category }
}

/// Sniff a file on disk. Unreadable files fall back to the extension table.
pub fn sniff(path: &Path) -> FileKind {
    let extension = path.extension().and_then(|e| e.to_str());

    let mut head = Vec::with_capacity(SNIFF_LEN);
    if let Ok(file) = std::fs::File::open(path) {
        let _ = file.take(SNIFF_LEN as u64).read_to_end(&mut head);
    }

    classify(&head, extension)
}
