//! Venue record types shared by the parser, the HTTP layer, and the
//! research prompt.

use serde::{Deserialize, Serialize};

/// A venue website as reported by the LLM.
///
/// `Unknown` is an explicit absent-marker: the source text said the
/// website is unknown, which is distinct from the `WEBSITE:` label being
/// missing entirely (represented by `None` at the field level) and from
/// an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Website {
    Url(String),
    Unknown,
}

/// One venue extracted from a discovery response block.
///
/// `name` and `city` are the only required fields; everything else is
/// best-effort. Serialized field names are the browser contract:
/// `venue_type` appears as `"type"`, optional fields are omitted when
/// absent, and `website` is `null` when explicitly unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub name: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub venue_type: Option<String>,
    #[serde(default, with = "website_field", skip_serializing_if = "Option::is_none")]
    pub website: Option<Website>,
    pub match_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VenueRecord {
    /// Website text for human-facing contexts (the research prompt):
    /// the URL when known, `"Unknown"` otherwise.
    pub fn website_display(&self) -> &str {
        match &self.website {
            Some(Website::Url(url)) => url.as_str(),
            Some(Website::Unknown) | None => "Unknown",
        }
    }
}

/// Serde bridge for `Option<Website>`:
/// missing key → `None`, JSON `null` → `Some(Unknown)`, string → `Some(Url)`.
///
/// The distinction must survive a round-trip because `/research` feeds a
/// previously serialized record back in as input context.
mod website_field {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Website;

    pub fn serialize<S>(value: &Option<Website>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(Website::Url(url)) => serializer.serialize_str(url),
            // `None` is unreachable here (skip_serializing_if), but both
            // arms serialize to JSON null.
            Some(Website::Unknown) | None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Website>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let url = Option::<String>::deserialize(deserializer)?;
        Ok(Some(match url {
            Some(url) => Website::Url(url),
            None => Website::Unknown,
        }))
    }
}
