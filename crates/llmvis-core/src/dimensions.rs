//! The five input dimensions a response set can be filtered or grouped by.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bucket used for records whose dimension value is missing or blank.
pub const UNKNOWN_BUCKET: &str = "unknown";

/// Closed set of grouping dimensions accepted at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupDimension {
    Region,
    #[serde(rename = "language_code")]
    Language,
    Model,
    Keyword,
    PromptTemplate,
}

impl GroupDimension {
    pub const ALL: [GroupDimension; 5] = [
        GroupDimension::Region,
        GroupDimension::Language,
        GroupDimension::Model,
        GroupDimension::Keyword,
        GroupDimension::PromptTemplate,
    ];

    /// Name of the matching field and column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GroupDimension::Region => "region",
            GroupDimension::Language => "language_code",
            GroupDimension::Model => "model",
            GroupDimension::Keyword => "keyword",
            GroupDimension::PromptTemplate => "prompt_template",
        }
    }
}

impl fmt::Display for GroupDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown grouping dimension '{0}'; expected one of region, language_code, model, keyword, prompt_template")]
pub struct UnknownDimension(pub String);

impl FromStr for GroupDimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "region" => Ok(GroupDimension::Region),
            "language" | "language_code" => Ok(GroupDimension::Language),
            "model" => Ok(GroupDimension::Model),
            "keyword" => Ok(GroupDimension::Keyword),
            "prompt_template" => Ok(GroupDimension::PromptTemplate),
            other => Err(UnknownDimension(other.to_string())),
        }
    }
}

/// Exact-match filters over the five dimensions. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionFilters {
    pub region: Option<String>,
    pub language_code: Option<String>,
    pub model: Option<String>,
    pub keyword: Option<String>,
    pub prompt_template: Option<String>,
}
