use serde::{Deserialize, Serialize};

/// Notion rejects rich-text segments longer than this many characters.
pub const MAX_RICH_TEXT_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichText {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: TextContent,
}

impl RichText {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            kind: "text",
            text: TextContent {
                content: content.into(),
            },
        }
    }
}

/// Splits `text` into segments that each fit in one rich-text object.
pub fn rich_text_segments(text: &str) -> Vec<RichText> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![RichText::plain(String::new())];
    }
    chars
        .chunks(MAX_RICH_TEXT_CHARS)
        .map(|chunk| RichText::plain(chunk.iter().collect::<String>()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageParent {
    DatabaseId { database_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleProperty {
    pub title: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePageRequest {
    pub parent: PageParent,
    pub properties: std::collections::BTreeMap<String, TitleProperty>,
}

impl CreatePageRequest {
    pub fn in_database(database_id: &str, title_property: &str, title: &str) -> Self {
        let mut properties = std::collections::BTreeMap::new();
        properties.insert(
            title_property.to_string(),
            TitleProperty {
                title: rich_text_segments(title),
            },
        );
        Self {
            parent: PageParent::DatabaseId {
                database_id: database_id.to_string(),
            },
            properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphContent {
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphBlock {
    pub object: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub paragraph: ParagraphContent,
}

impl ParagraphBlock {
    pub fn new(text: &str) -> Self {
        Self {
            object: "block",
            kind: "paragraph",
            paragraph: ParagraphContent {
                rich_text: rich_text_segments(text),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppendBlockChildrenRequest {
    pub children: Vec<ParagraphBlock>,
}

impl AppendBlockChildrenRequest {
    pub fn paragraph(text: &str) -> Self {
        Self {
            children: vec![ParagraphBlock::new(text)],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageResponse {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockResponse {
    pub id: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub in_trash: bool,
}

impl BlockResponse {
    pub fn is_live(&self) -> bool {
        !self.archived && !self.in_trash
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendBlockChildrenResponse {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

/// Error payload Notion returns with every non-2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotionErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
