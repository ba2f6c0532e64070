//! Centralized prompt construction for both LLM calls.
//!
//! Every prompt sent to the Anthropic API is built here so there is
//! exactly one place to review and test the strings that reach the model.
//! The discovery prompt doubles as the parser's input contract: it
//! instructs the model to emit one `---`-delimited block per venue with
//! the exact labels [`crate::parse::FIELD_LABELS`]. Changing the template
//! without changing the parser (or vice versa) breaks extraction, which
//! is why the prompt tests assert every label is present.
//!
//! Profile fields are user-typed free text interpolated into the prompt;
//! a malicious value could attempt to restate the output format. The
//! blast radius is bounded (a confused response just parses to fewer
//! records), so no fencing is applied here.

use crate::profile::ArtistProfile;
use crate::venue::VenueRecord;

/// Build the venue discovery prompt for one artist/city pair.
///
/// The response format block must stay in lockstep with the parser's
/// label and delimiter contract.
pub fn discovery(profile: &ArtistProfile, target_city: &str) -> String {
    format!(
        "Find 10-15 music venues in {target_city} for this artist:\n\
         \n\
         Artist: {name}\n\
         Genre: {genre}\n\
         Draw: {draw}\n\
         Similar Artists: {similar}\n\
         \n\
         For EACH venue, format EXACTLY like this:\n\
         ---\n\
         VENUE: [name]\n\
         CITY: [city]\n\
         STATE: [state]\n\
         CAPACITY: [number or unknown]\n\
         TYPE: [type]\n\
         WEBSITE: [url or unknown]\n\
         MATCH_SCORE: [0-100]\n\
         REASON: [one sentence]\n\
         ---\n\
         \n\
         Search thoroughly for venues that book {genre} music.",
        name = profile.name,
        genre = profile.genre,
        draw = profile.draw_size,
        similar = profile.similar_artists_display(),
    )
}

/// Build the deep-dive research prompt for one chosen venue.
///
/// Asks for a six-section booking intelligence report and urges the model
/// to lean on web search. The response is displayed as-is; nothing here
/// is machine-parsed.
pub fn research(venue: &VenueRecord, profile: &ArtistProfile) -> String {
    let location = match venue.state.as_deref() {
        Some(state) => format!("{}, {state}", venue.city),
        None => venue.city.clone(),
    };

    format!(
        "Deep research on this venue for booking:\n\
         \n\
         VENUE: {venue_name}\n\
         Location: {location}\n\
         Website: {website}\n\
         \n\
         ARTIST: {artist}\n\
         Genre: {genre}\n\
         Draw: {draw}\n\
         Fee Range: {fee}\n\
         \n\
         Provide detailed intelligence on:\n\
         \n\
         1. BOOKING CONTACT\n\
            - Name, title, email, phone\n\
            - Best contact method and timing\n\
         \n\
         2. BOOKING PROCESS\n\
            - Lead time, decision process, response time\n\
            - EPK requirements\n\
         \n\
         3. RECENT ACTIVITY\n\
            - Recent shows, current booking activity\n\
            - Similar artists played here\n\
         \n\
         4. DEAL STRUCTURE\n\
            - Typical guarantees, percentage splits\n\
            - Merch terms, what's included\n\
         \n\
         5. STRATEGIC VALUE\n\
            - Venue prestige, market importance\n\
            - Career building potential\n\
         \n\
         6. NEXT STEPS\n\
            - Specific action items for outreach\n\
         \n\
         Be thorough. Use web search extensively.",
        venue_name = venue.name,
        website = venue.website_display(),
        artist = profile.name,
        genre = profile.genre,
        draw = profile.draw_size,
        fee = profile.fee_range_display(),
    )
}
