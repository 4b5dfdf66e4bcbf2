use serde::{Deserialize, Serialize};

/// Discriminates the two tile kinds the news grid mixes together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Gallery,
}

/// One tile of content as handed over by the content layer.
///
/// The layout engine only reads these fields; everything else about the
/// article or gallery (title, images, body) stays with the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub is_featured: bool,
    pub content_type: ContentType,
}

#[cfg(test)]
impl ContentItem {
    pub fn article(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            is_featured: false,
            content_type: ContentType::Article,
        }
    }

    pub fn gallery(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: "matchGallery".to_string(),
            is_featured: false,
            content_type: ContentType::Gallery,
        }
    }

    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }
}
