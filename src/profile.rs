//! Artist profile submitted by the browser (or assembled from CLI flags).

use serde::{Deserialize, Serialize};

use crate::error::VenueScoutError;

/// Shown in prompts when an optional profile field was left blank.
const NOT_PROVIDED: &str = "N/A";

/// The artist profile driving discovery and research prompts.
///
/// Field names are camelCase on the wire to match the browser form.
/// `name`, `genre`, and `draw_size` are required by the form; the rest
/// render as `N/A` in prompts when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistProfile {
    pub name: String,
    pub genre: String,
    pub draw_size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_artists: Option<String>,
}

impl ArtistProfile {
    /// Rejects profiles whose required fields are blank. The browser form
    /// enforces this too, but the endpoints are callable directly.
    pub fn validate(&self) -> Result<(), VenueScoutError> {
        for (field, value) in [("name", &self.name), ("genre", &self.genre)] {
            if value.trim().is_empty() {
                return Err(VenueScoutError::BlankField { field });
            }
        }
        Ok(())
    }

    pub fn fee_range_display(&self) -> &str {
        self.fee_range.as_deref().unwrap_or(NOT_PROVIDED)
    }

    pub fn similar_artists_display(&self) -> &str {
        self.similar_artists.as_deref().unwrap_or(NOT_PROVIDED)
    }
}
