use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the `dramas` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Drama {
    pub title: String,
    pub year: i32,
    /// Average rating out of 10
    pub rating: f64,
    pub rating_count: i64,
    pub description: String,
    pub country: String,
    pub episodes: i32,
    pub airing_start: Option<NaiveDate>,
    pub airing_end: Option<NaiveDate>,
    pub network: String,
    pub duration: String,
    pub content_rating: String,
    /// Comma-separated genre tags
    pub genre: Option<String>,
    pub trailer_url: String,
    pub image_url: String,
}

impl Drama {
    /// Genre tags split on commas, trimmed, empties dropped
    pub fn genres(&self) -> Vec<&str> {
        self.genre
            .as_deref()
            .map(|g| {
                g.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) fn sample_drama() -> Drama {
    Drama {
        title: "Crash Landing on You".to_string(),
        year: 2019,
        rating: 9.1,
        rating_count: 48213,
        description: "A paragliding mishap drops a South Korean heiress in North Korea.".to_string(),
        country: "South Korea".to_string(),
        episodes: 16,
        airing_start: NaiveDate::from_ymd_opt(2019, 12, 14),
        airing_end: NaiveDate::from_ymd_opt(2020, 2, 16),
        network: "tvN".to_string(),
        duration: "1 hr. 25 min.".to_string(),
        content_rating: "15+ - Teens 15 or older".to_string(),
        genre: Some("Romance, Comedy".to_string()),
        trailer_url: "https://example.com/trailer/cloy".to_string(),
        image_url: "https://example.com/image/cloy.jpg".to_string(),
    }
}
