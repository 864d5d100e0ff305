//! Record types for the three input tables and the combined output

use serde::{Deserialize, Deserializer};

/// One row of the answers file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Answer {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "ParentId")]
    pub parent_id: u64,
    #[serde(rename = "Body")]
    pub body: String,
}

/// One row of the questions file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Question {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Body")]
    pub body: String,
}

/// One (question, tag) pair of the tags file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tag {
    #[serde(rename = "Id")]
    pub question_id: u64,
    #[serde(rename = "Tag", deserialize_with = "nullable_string")]
    pub tag: Option<String>,
}

/// One row of text with a single tag, ready for training
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedRecord {
    pub question_id: u64,
    pub text: String,
    pub tag: String,
}

/// Empty fields and the export's `NA` marker are missing values
fn nullable_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty() && s != "NA"))
}
