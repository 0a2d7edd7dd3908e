use chrono::NaiveDate;

use crate::{error::LookupError, models::Drama};

/// Reply to the greeting command
pub const GREETING: &str = "Hello! Send me a drama name to search.";

/// Placeholder for missing dates and genres
pub const UNKNOWN: &str = "Unknown";

const DATE_FORMAT: &str = "%b %d, %Y";

/// Renders lookup results as Markdown replies
#[derive(Debug, Clone)]
pub struct ReplyFormatter {
    bot_username: String,
}

impl ReplyFormatter {
    pub fn new(bot_username: impl Into<String>) -> Self {
        Self {
            bot_username: bot_username.into(),
        }
    }

    /// Formats a drama, or the not-found message when there is none
    pub fn format(&self, drama: Option<&Drama>, display_name: &str) -> String {
        let Some(drama) = drama else {
            return not_found(display_name);
        };

        format!(
            "**{name} via @{bot}**\n\
             **{title} ({year})**\n\
             ⭐️ Rating: {rating:.1}/10 from {rating_count} users [MyDramaList]({image_url})\n\
             \n\
             `{description}`\n\
             \n\
             **Country**: `{country}`\n\
             **Episodes**: `{episodes}`\n\
             **Aired**: `{start} - {end}`\n\
             **Network**: `{network}`\n\
             **Duration**: `{duration}`\n\
             **Content Rating**: `{content_rating}`\n\
             \n\
             **Genre**: {genre}\n\
             \n\
             [▶️ Watch Trailer]({trailer_url})",
            name = display_name,
            bot = self.bot_username,
            title = drama.title,
            year = drama.year,
            rating = drama.rating,
            rating_count = drama.rating_count,
            image_url = drama.image_url,
            description = drama.description,
            country = drama.country,
            episodes = drama.episodes,
            start = format_date(drama.airing_start),
            end = format_date(drama.airing_end),
            network = drama.network,
            duration = drama.duration,
            content_rating = drama.content_rating,
            genre = format_genres(drama),
            trailer_url = drama.trailer_url,
        )
    }

    /// Maps a lookup outcome to user-safe text. Causes are never included.
    pub fn format_lookup(
        &self,
        result: &Result<Option<Drama>, LookupError>,
        display_name: &str,
    ) -> String {
        match result {
            Ok(drama) => self.format(drama.as_ref(), display_name),
            Err(e) if e.is_busy() => busy(display_name),
            Err(_) => not_found(display_name),
        }
    }
}

pub fn not_found(display_name: &str) -> String {
    format!("Sorry, {display_name}, no details found for the requested drama.")
}

pub fn busy(display_name: &str) -> String {
    format!("Sorry, {display_name}, I'm handling a lot of searches right now. Please try again in a moment.")
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn format_genres(drama: &Drama) -> String {
    let genres = drama.genres();
    if genres.is_empty() {
        return UNKNOWN.to_string();
    }
    genres
        .iter()
        .map(|g| format!("#{g}"))
        .collect::<Vec<_>>()
        .join(" ")
}
