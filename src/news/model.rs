use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// News row joined with its author's display name.
#[derive(Debug, FromRow, Clone)]
pub struct NewsRow {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub image_public_id: Option<String>,
    pub content: String,
    pub created_by: Option<String>,
    pub editor: Option<String>,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub image_public_id: Option<String>,
    pub content: String,
    pub excerpt: String,
    pub created_by: Option<String>,
    pub author_name: String,
    pub views: i64,
    pub is_published: bool,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = crate::schema_ext::DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
}

impl From<NewsRow> for NewsResponse {
    fn from(row: NewsRow) -> Self {
        let author_name = row
            .author_name
            .or(row.editor)
            .unwrap_or_else(|| "Unknown".to_string());
        Self {
            id: row.id,
            title: row.title,
            image_url: row.image_url,
            image_public_id: row.image_public_id,
            excerpt: excerpt(&row.content),
            content: row.content,
            created_by: row.created_by,
            author_name,
            views: row.views,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const EXCERPT_LENGTH: usize = 150;

/// Plain-text preview of the rich-text content, truncated to 150 characters.
pub fn excerpt(content: &str) -> String {
    let plain = strip_html(content);
    let mut text: String = plain.chars().take(EXCERPT_LENGTH).collect();
    if plain.chars().count() > EXCERPT_LENGTH {
        text.push_str("...");
    }
    text
}

/// Remove HTML tags. The content comes from the admin rich-text editor, so a
/// simple tag scanner is sufficient here.
fn strip_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_tag = false;
    for c in content.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Sort orders supported by the admin news list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NewsSort {
    Newest,
    Oldest,
    MostViewed,
    TitleAsc,
}

impl NewsSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("newest") {
            "oldest" => NewsSort::Oldest,
            "most-viewed" => NewsSort::MostViewed,
            "title" => NewsSort::TitleAsc,
            _ => NewsSort::Newest,
        }
    }

    pub fn order_by(&self) -> &'static str {
        match self {
            NewsSort::Newest => "n.created_at DESC",
            NewsSort::Oldest => "n.created_at ASC",
            NewsSort::MostViewed => "n.views DESC, n.created_at DESC",
            NewsSort::TitleAsc => "LOWER(n.title) ASC",
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            current_page: page,
            total_pages: (total + limit - 1) / limit,
            total_items: total,
            items_per_page: limit,
        }
    }
}

/// Text fields accompanying a news upload.
#[derive(Debug, Default)]
pub struct NewsFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("News not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] crate::upload::UploadError),
}

/// Escape LIKE wildcards so user search input matches literally.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_strips_tags_and_truncates() {
        let content = "<p>Polres menggelar <b>razia</b> di kawasan pelabuhan.</p>";
        assert_eq!(excerpt(content), "Polres menggelar razia di kawasan pelabuhan.");

        let long = format!("<div>{}</div>", "a".repeat(200));
        let result = excerpt(&long);
        assert_eq!(result.chars().count(), 153); // 150 + "..."
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_excerpt_short_content_has_no_ellipsis() {
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(NewsSort::parse(None), NewsSort::Newest);
        assert_eq!(NewsSort::parse(Some("oldest")), NewsSort::Oldest);
        assert_eq!(NewsSort::parse(Some("most-viewed")), NewsSort::MostViewed);
        assert_eq!(NewsSort::parse(Some("title")), NewsSort::TitleAsc);
        assert_eq!(NewsSort::parse(Some("bogus")), NewsSort::Newest);
    }

    #[test]
    fn test_sort_order_clauses() {
        assert_eq!(NewsSort::Newest.order_by(), "n.created_at DESC");
        assert_eq!(NewsSort::TitleAsc.order_by(), "LOWER(n.title) ASC");
    }

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(1, 6, 13);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.total_items, 13);

        assert_eq!(Pagination::new(1, 6, 12).total_pages, 2);
        assert_eq!(Pagination::new(1, 6, 0).total_pages, 0);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_author_name_fallback_chain() {
        let base = NewsRow {
            id: 1,
            title: "Judul".to_string(),
            image_url: "https://res.example/n.jpg".to_string(),
            image_public_id: None,
            content: "Isi".to_string(),
            created_by: None,
            editor: Some("Redaksi".to_string()),
            views: 0,
            is_published: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            author_name: None,
        };

        // Legacy editor field wins when there is no linked admin.
        assert_eq!(NewsResponse::from(base.clone()).author_name, "Redaksi");

        let with_admin = NewsRow {
            author_name: Some("Budi Santoso".to_string()),
            ..base.clone()
        };
        assert_eq!(NewsResponse::from(with_admin).author_name, "Budi Santoso");

        let neither = NewsRow {
            editor: None,
            ..base
        };
        assert_eq!(NewsResponse::from(neither).author_name, "Unknown");
    }
}
