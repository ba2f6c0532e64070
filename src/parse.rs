//! Venue block parser: turns the discovery response text into
//! [`VenueRecord`]s.
//!
//! The LLM is instructed (see [`crate::prompt`]) to emit one venue per
//! `---`-delimited block, each field on its own `LABEL:` line. That format
//! is prompt-enforced only, so extraction is maximally permissive: every
//! field is matched independently, a block that fails to yield the two
//! required fields is skipped with a warning, and the parser as a whole
//! never fails; malformed input degrades to fewer or emptier records.

use std::sync::OnceLock;

use regex::Regex;

use crate::venue::{VenueRecord, Website};

/// Separator between venue blocks in the raw response.
pub const BLOCK_DELIMITER: &str = "---";

/// Field labels the LLM is instructed to emit, in block order. The parser
/// and the discovery prompt share this contract.
pub const FIELD_LABELS: [&str; 8] = [
    "VENUE:",
    "CITY:",
    "STATE:",
    "CAPACITY:",
    "TYPE:",
    "WEBSITE:",
    "MATCH_SCORE:",
    "REASON:",
];

/// Fallback score when `MATCH_SCORE:` is missing or unparsable.
const DEFAULT_MATCH_SCORE: u8 = 70;

/// A block that cannot produce a valid record.
///
/// Only the two required fields can fail a block; everything else is
/// best-effort and silently omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("block has no usable {label} value")]
    MissingField { label: &'static str },
}

static NAME_RE: OnceLock<Regex> = OnceLock::new();
static CITY_RE: OnceLock<Regex> = OnceLock::new();
static STATE_RE: OnceLock<Regex> = OnceLock::new();
static CAPACITY_RE: OnceLock<Regex> = OnceLock::new();
static TYPE_RE: OnceLock<Regex> = OnceLock::new();
static WEBSITE_RE: OnceLock<Regex> = OnceLock::new();
static SCORE_RE: OnceLock<Regex> = OnceLock::new();
static REASON_RE: OnceLock<Regex> = OnceLock::new();
static DIGITS_RE: OnceLock<Regex> = OnceLock::new();
static NEXT_LABEL_RE: OnceLock<Regex> = OnceLock::new();

/// Compiled once; every pattern is a valid literal so init cannot fail at
/// runtime.
fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid literal regex"))
}

/// Parse a raw discovery response into venue records.
///
/// Splits on [`BLOCK_DELIMITER`], ignores blocks without a `VENUE:` label
/// (preamble, commentary), and extracts one record per surviving block.
/// Blocks missing a name or city are logged at `warn` and skipped; their
/// partial data is discarded. Output order follows block order. Never
/// panics and never returns an error; an input with no parseable block
/// yields an empty vector.
pub fn parse_venues(raw: &str) -> Vec<VenueRecord> {
    let mut venues = Vec::new();

    for (ordinal, block) in raw.split(BLOCK_DELIMITER).enumerate() {
        if !block.contains("VENUE:") {
            continue;
        }
        match parse_block(block) {
            Ok(venue) => venues.push(venue),
            Err(e) => {
                tracing::warn!(block = ordinal, error = %e, "skipping unparseable venue block");
            }
        }
    }

    venues
}

/// Extract a single record from one block.
///
/// Each field is matched independently; the value is the rest of the line
/// after the first occurrence of the label. `REASON:` alone may span
/// multiple lines, ending at the next recognized label line or the end of
/// the block.
pub fn parse_block(block: &str) -> Result<VenueRecord, ParseError> {
    let name = line_value(cached(&NAME_RE, r"VENUE:\s*(.+?)(?:\n|$)"), block)
        .ok_or(ParseError::MissingField { label: "VENUE:" })?;
    let city = line_value(cached(&CITY_RE, r"CITY:\s*(.+?)(?:\n|$)"), block)
        .ok_or(ParseError::MissingField { label: "CITY:" })?;

    let state = line_value(cached(&STATE_RE, r"STATE:\s*(.+?)(?:\n|$)"), block);
    let venue_type = line_value(cached(&TYPE_RE, r"TYPE:\s*(.+?)(?:\n|$)"), block);

    let capacity = line_value(cached(&CAPACITY_RE, r"CAPACITY:\s*(.+?)(?:\n|$)"), block)
        .and_then(|text| parse_capacity(&text));

    let website = line_value(cached(&WEBSITE_RE, r"WEBSITE:\s*(.+?)(?:\n|$)"), block)
        .map(|text| {
            if text.eq_ignore_ascii_case("unknown") {
                Website::Unknown
            } else {
                Website::Url(text)
            }
        });

    let match_score = cached(&SCORE_RE, r"MATCH_SCORE:\s*(\d+)")
        .captures(block)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .map_or(DEFAULT_MATCH_SCORE, |n| n.min(100) as u8);

    let reason = reason_value(block);

    Ok(VenueRecord {
        name,
        city,
        state,
        capacity,
        venue_type,
        website,
        match_score,
        reason,
    })
}

/// First match of `re` in `block`, trimmed; `None` when absent or blank.
fn line_value(re: &Regex, block: &str) -> Option<String> {
    let value = re.captures(block)?[1].trim().to_owned();
    if value.is_empty() { None } else { Some(value) }
}

/// `CAPACITY:` normalization: "unknown" (any case) and digit-free text
/// yield no capacity; otherwise the first run of decimal digits is the
/// value ("1,200" parses as 1).
fn parse_capacity(text: &str) -> Option<u32> {
    if text.eq_ignore_ascii_case("unknown") {
        return None;
    }
    cached(&DIGITS_RE, r"\d+")
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// `REASON:` absorbs everything after the label up to the next recognized
/// label at a line start or the end of the block.
fn reason_value(block: &str) -> Option<String> {
    let caps = cached(&REASON_RE, r"(?s)REASON:\s*(.+)$").captures(block)?;
    let tail = &caps[1];

    let terminator = r"(?m)^\s*(?:VENUE|CITY|STATE|CAPACITY|TYPE|WEBSITE|MATCH_SCORE|REASON):";
    let end = cached(&NEXT_LABEL_RE, terminator)
        .find(tail)
        .map_or(tail.len(), |m| m.start());

    let reason = tail[..end].trim().to_owned();
    if reason.is_empty() { None } else { Some(reason) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
VENUE: The Bluebird
CITY: Nashville
STATE: TN
CAPACITY: 90
MATCH_SCORE: 88
REASON: Great acoustic room.";

    #[test]
    fn well_formed_block_yields_full_record() {
        let venues = parse_venues(WELL_FORMED);

        assert_eq!(venues.len(), 1);
        let v = &venues[0];
        assert_eq!(v.name, "The Bluebird");
        assert_eq!(v.city, "Nashville");
        assert_eq!(v.state.as_deref(), Some("TN"));
        assert_eq!(v.capacity, Some(90));
        assert_eq!(v.match_score, 88);
        assert_eq!(v.reason.as_deref(), Some("Great acoustic room."));
        assert!(v.venue_type.is_none());
        assert!(v.website.is_none());
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(parse_venues("").is_empty());
    }

    #[test]
    fn input_without_delimiters_still_parses_one_block() {
        let venues = parse_venues("VENUE: Solo Room\nCITY: Austin");
        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].name, "Solo Room");
    }

    #[test]
    fn prose_without_venue_label_is_ignored() {
        let raw = "Here are some venues I found for you:\n---\nVENUE: The Spot\nCITY: Denver\n---\nLet me know if you need more!";
        let venues = parse_venues(raw);

        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].name, "The Spot");
    }

    #[test]
    fn block_missing_city_is_dropped() {
        let raw = "VENUE: No City Hall\nSTATE: TX\nCAPACITY: 500\nMATCH_SCORE: 95";
        assert!(parse_venues(raw).is_empty());
    }

    #[test]
    fn block_missing_name_is_dropped_even_with_venue_label_present() {
        // The VENUE: label gate passes, but the value line is blank.
        let raw = "VENUE:\nCITY: Portland";
        assert!(parse_venues(raw).is_empty());
    }

    #[test]
    fn malformed_block_does_not_affect_neighbors() {
        let raw = "\
---
VENUE: Broken
STATE: OR
---
VENUE: The Keep
CITY: Seattle
MATCH_SCORE: 72
---";
        let venues = parse_venues(raw);

        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].name, "The Keep");
        assert_eq!(venues[0].match_score, 72);
    }

    #[test]
    fn output_order_matches_block_order() {
        let raw = "\
VENUE: Zebra Lounge
CITY: Chicago
---
VENUE: Aardvark Hall
CITY: Boston";
        let venues = parse_venues(raw);

        assert_eq!(venues.len(), 2);
        assert_eq!(venues[0].name, "Zebra Lounge");
        assert_eq!(venues[1].name, "Aardvark Hall");
    }

    #[test]
    fn capacity_unknown_omits_field() {
        let raw = "VENUE: Mystery Bar\nCITY: Memphis\nCAPACITY: unknown";
        let venues = parse_venues(raw);
        assert_eq!(venues[0].capacity, None);
    }

    #[test]
    fn capacity_unknown_is_case_insensitive() {
        let raw = "VENUE: Mystery Bar\nCITY: Memphis\nCAPACITY: UNKNOWN";
        assert_eq!(parse_venues(raw)[0].capacity, None);
    }

    #[test]
    fn capacity_takes_first_digit_run() {
        let raw = "VENUE: Big Hall\nCITY: Atlanta\nCAPACITY: 1,200 standing";
        assert_eq!(parse_venues(raw)[0].capacity, Some(1));
    }

    #[test]
    fn capacity_approximate_text_extracts_digits() {
        let raw = "VENUE: Side Room\nCITY: Tulsa\nCAPACITY: about 350 people";
        assert_eq!(parse_venues(raw)[0].capacity, Some(350));
    }

    #[test]
    fn capacity_without_digits_omits_field() {
        let raw = "VENUE: Vague Venue\nCITY: Omaha\nCAPACITY: pretty big";
        assert_eq!(parse_venues(raw)[0].capacity, None);
    }

    #[test]
    fn missing_match_score_defaults_to_70() {
        let raw = "VENUE: Quiet Corner\nCITY: Madison";
        assert_eq!(parse_venues(raw)[0].match_score, 70);
    }

    #[test]
    fn non_numeric_match_score_defaults_to_70() {
        let raw = "VENUE: Quiet Corner\nCITY: Madison\nMATCH_SCORE: high";
        assert_eq!(parse_venues(raw)[0].match_score, 70);
    }

    #[test]
    fn oversized_match_score_clamps_to_100() {
        let raw = "VENUE: Overachiever\nCITY: Reno\nMATCH_SCORE: 150";
        assert_eq!(parse_venues(raw)[0].match_score, 100);
    }

    #[test]
    fn website_unknown_becomes_absent_marker() {
        for spelling in ["unknown", "Unknown", "UNKNOWN"] {
            let raw = format!("VENUE: The Cave\nCITY: Boise\nWEBSITE: {spelling}");
            let venues = parse_venues(&raw);
            assert_eq!(
                venues[0].website,
                Some(Website::Unknown),
                "spelling {spelling:?}"
            );
        }
    }

    #[test]
    fn website_url_kept_verbatim() {
        let raw = "VENUE: The Cave\nCITY: Boise\nWEBSITE: https://thecave.example.com";
        assert_eq!(
            parse_venues(raw)[0].website,
            Some(Website::Url("https://thecave.example.com".to_owned()))
        );
    }

    #[test]
    fn website_label_missing_leaves_field_absent() {
        let raw = "VENUE: The Cave\nCITY: Boise";
        assert_eq!(parse_venues(raw)[0].website, None);
    }

    #[test]
    fn absent_marker_is_distinguishable_from_missing_label() {
        let unknown = parse_venues("VENUE: A\nCITY: B\nWEBSITE: unknown");
        let missing = parse_venues("VENUE: A\nCITY: B");
        assert_ne!(unknown[0].website, missing[0].website);
    }

    #[test]
    fn reason_spans_lines_until_end_of_block() {
        let raw = "\
VENUE: The Loft
CITY: Columbus
REASON: Books similar acts regularly
and has a strong local following.";
        let venues = parse_venues(raw);

        assert_eq!(
            venues[0].reason.as_deref(),
            Some("Books similar acts regularly\nand has a strong local following.")
        );
    }

    #[test]
    fn reason_stops_at_next_label_line() {
        // Field order drifted: REASON is not last in this block.
        let raw = "\
VENUE: The Loft
CITY: Columbus
REASON: Solid mid-size room.
WEBSITE: unknown";
        let venues = parse_venues(raw);

        assert_eq!(venues[0].reason.as_deref(), Some("Solid mid-size room."));
        assert_eq!(venues[0].website, Some(Website::Unknown));
    }

    #[test]
    fn blank_reason_is_omitted() {
        let raw = "VENUE: The Loft\nCITY: Columbus\nREASON:   ";
        assert_eq!(parse_venues(raw)[0].reason, None);
    }

    #[test]
    fn fields_are_trimmed() {
        let raw = "VENUE:   Padded Hall  \nCITY:  Fargo \nSTATE:  ND  ";
        let venues = parse_venues(raw);

        assert_eq!(venues[0].name, "Padded Hall");
        assert_eq!(venues[0].city, "Fargo");
        assert_eq!(venues[0].state.as_deref(), Some("ND"));
    }

    #[test]
    fn realistic_multi_block_response() {
        let raw = "\
I searched for venues matching your profile. Here's what I found:

---
VENUE: The Bluebird Cafe
CITY: Nashville
STATE: TN
CAPACITY: 90
TYPE: Listening room
WEBSITE: https://bluebirdcafe.com
MATCH_SCORE: 92
REASON: Legendary songwriter venue with an attentive audience.
---
VENUE: Exit/In
CITY: Nashville
STATE: TN
CAPACITY: 500
TYPE: Rock club
WEBSITE: unknown
MATCH_SCORE: 81
REASON: Storied club that books rising touring acts.
---

These should suit a 200-400 draw.";
        let venues = parse_venues(raw);

        assert_eq!(venues.len(), 2);
        assert_eq!(venues[0].name, "The Bluebird Cafe");
        assert_eq!(
            venues[0].website,
            Some(Website::Url("https://bluebirdcafe.com".to_owned()))
        );
        assert_eq!(venues[1].name, "Exit/In");
        assert_eq!(venues[1].website, Some(Website::Unknown));
        assert_eq!(venues[1].capacity, Some(500));
    }

    #[test]
    fn parse_block_reports_which_field_is_missing() {
        let err = parse_block("VENUE: Somewhere\nSTATE: NM").unwrap_err();
        assert_eq!(err, ParseError::MissingField { label: "CITY:" });

        let err = parse_block("CITY: Santa Fe").unwrap_err();
        assert_eq!(err, ParseError::MissingField { label: "VENUE:" });
    }

    #[test]
    fn crlf_input_parses() {
        let raw = "VENUE: Windows Room\r\nCITY: Redmond\r\nMATCH_SCORE: 60\r\n";
        let venues = parse_venues(raw);

        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].name, "Windows Room");
        assert_eq!(venues[0].city, "Redmond");
        assert_eq!(venues[0].match_score, 60);
    }
}
