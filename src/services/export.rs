//! Export of the collection as JSON, Netscape bookmark HTML or a backup.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::managers::category_manager::CategoryTree;
use crate::types::bookmark::{Bookmark, CategoryTreeNode};
use crate::types::errors::ExportError;
use crate::types::snapshot::{BackupDocument, ExportDocument, STATE_VERSION};

/// Output format of [`export_filename`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Html,
}

impl ExportFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "html" => Some(ExportFormat::Html),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }
}

const NETSCAPE_HEADER: &str = "<!DOCTYPE NETSCAPE-Bookmark-file-1>\n\
<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n\
<TITLE>Bookmarks</TITLE>\n\
<H1>Bookmarks</H1>";

/// `bookmarks_YYYY-MM-DD.<ext>`
pub fn export_filename(format: ExportFormat, now: DateTime<Utc>) -> String {
    format!("bookmarks_{}.{}", now.format("%Y-%m-%d"), format.extension())
}

/// `bookmark-backup-YYYY-MM-DD.json`
pub fn backup_filename(now: DateTime<Utc>) -> String {
    format!("bookmark-backup-{}.json", now.format("%Y-%m-%d"))
}

pub fn export_json(tree: &CategoryTree, bookmarks: &[Bookmark], now: DateTime<Utc>) -> Result<String, ExportError> {
    let doc = ExportDocument {
        bookmarks: bookmarks.to_vec(),
        categories: tree.categories().to_vec(),
        export_date: now,
    };
    serde_json::to_string_pretty(&doc).map_err(|e| ExportError::Serialization(e.to_string()))
}

pub fn backup_json(tree: &CategoryTree, bookmarks: &[Bookmark], now: DateTime<Utc>) -> Result<String, ExportError> {
    let doc = BackupDocument {
        bookmarks: bookmarks.to_vec(),
        categories: tree.categories().to_vec(),
        version: STATE_VERSION.to_string(),
        backup_date: now,
    };
    serde_json::to_string_pretty(&doc).map_err(|e| ExportError::Serialization(e.to_string()))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn push_link(lines: &mut Vec<String>, indent: &str, bookmark: &Bookmark) {
    lines.push(format!(
        "{}<DT><A HREF=\"{}\" ADD_DATE=\"{}\">{}</A>",
        indent,
        escape_html(&bookmark.url),
        bookmark.created_at.timestamp(),
        escape_html(&bookmark.title)
    ));
}

fn push_category(lines: &mut Vec<String>, node: &CategoryTreeNode, bookmarks: &[Bookmark], depth: usize) {
    let indent = "    ".repeat(depth);
    lines.push(format!("{}<DT><H3>{}</H3>", indent, escape_html(&node.category.name)));
    lines.push(format!("{}<DL><p>", indent));
    let inner = "    ".repeat(depth + 1);
    for bookmark in bookmarks.iter().filter(|b| b.category == node.category.id) {
        push_link(lines, &inner, bookmark);
    }
    for child in &node.children {
        push_category(lines, child, bookmarks, depth + 1);
    }
    lines.push(format!("{}</DL><p>", indent));
}

/// Netscape bookmark file. Bookmarks without a live category are listed at
/// the root, ahead of the category blocks.
pub fn export_html(tree: &CategoryTree, bookmarks: &[Bookmark]) -> Result<String, ExportError> {
    let roots = tree.build_tree(bookmarks)?;
    let known: HashSet<&str> = tree.categories().iter().map(|c| c.id.as_str()).collect();

    let mut lines = vec![NETSCAPE_HEADER.to_string(), "<DL><p>".to_string()];
    for bookmark in bookmarks.iter().filter(|b| !known.contains(b.category.as_str())) {
        push_link(&mut lines, "    ", bookmark);
    }
    for node in &roots {
        push_category(&mut lines, node, bookmarks, 1);
    }
    lines.push("</DL><p>".to_string());
    Ok(lines.join("\n"))
}
