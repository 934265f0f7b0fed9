use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reserved id of the bucket that holds bookmarks without a category.
pub const DEFAULT_CATEGORY_ID: &str = "uncategorized";

/// A saved bookmark.
///
/// An empty `category` means the bookmark is unassigned. A `category` that
/// names a category which no longer exists is tolerated and counted as
/// uncategorized by aggregate views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub favicon: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub visit_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visited: Option<DateTime<Utc>>,
}

/// A node of the category hierarchy, stored flat with a parent reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_parent_id")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_expanded", deserialize_with = "deserialize_flag")]
    pub expanded: bool,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent_id: Option<&str>, order: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: parent_id.map(str::to_string),
            order,
            expanded: true,
        }
    }
}

fn default_expanded() -> bool {
    true
}

/// The persistence service stores `parentId` as nullable text, and older
/// snapshots carry `""` for root categories.
fn deserialize_parent_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|p| !p.is_empty()))
}

/// SQLite hands back `expanded` as 0/1.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Null(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
        Flag::Null(()) => true,
    })
}

/// A category with its children attached and a recursive bookmark count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTreeNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryTreeNode>,
    pub count: usize,
}

/// One row of the flattened category tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatCategory {
    pub category: Category,
    pub depth: usize,
    /// `name` prefixed with two spaces per level.
    pub label: String,
}

/// Form data for creating or editing a bookmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl BookmarkDraft {
    /// Splits a comma-separated tag field, dropping blanks.
    pub fn parse_tags(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A tag together with how many bookmarks carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}
