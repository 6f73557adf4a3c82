use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Who can see a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Public,
    #[default]
    Private,
    Protected,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Private => "PRIVATE",
            Visibility::Protected => "PROTECTED",
        }
    }
}

// Canonical note, identical whichever API generation produced it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub identifier: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub creator: String,
    pub tags: Vec<String>,
}

// Reduced view returned by the create tool
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNote {
    pub identifier: String,
    pub created_at: String,
    pub content: String,
}
