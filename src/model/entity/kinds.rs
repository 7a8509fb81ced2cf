use serde::{Deserialize, Serialize};

/// Publication status shared by courses and items.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Publish,
    Pending,
    Private,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Publish => "publish",
            Self::Pending => "pending",
            Self::Private => "private",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Video,
    Doc,
    Code,
    Live,
    Text,
}

impl ItemType {
    pub const ALL: [ItemType; 5] = [Self::Video, Self::Doc, Self::Code, Self::Live, Self::Text];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Doc => "doc",
            Self::Code => "code",
            Self::Live => "live",
            Self::Text => "text",
        }
    }

    /// Tab label in the content library.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Video => "Vídeos",
            Self::Doc => "Documentos",
            Self::Code => "Códigos",
            Self::Live => "Lives",
            Self::Text => "Textos",
        }
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown item type: {s}."))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    #[default]
    Free,
    Paid,
    Mixed,
}
