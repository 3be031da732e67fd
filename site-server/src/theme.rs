//! Seasonal theming
//!
//! Pure date-range predicates over the current date, plus the API handler
//! that reports the active season. A `?theme=` query parameter forces a
//! season regardless of the calendar, matching the original site's
//! preview behavior.

use serde::Serialize;
use time::{Date, Month, OffsetDateTime};

use crate::config::ThemeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Christmas,
    Halloween,
    None,
}

/// Dec 1-31 inclusive, any year.
pub fn is_christmas_season(date: Date) -> bool {
    date.month() == Month::December
}

/// Oct 1-31 inclusive, any year.
pub fn is_halloween_season(date: Date) -> bool {
    date.month() == Month::October
}

pub fn season_for_date(date: Date) -> Season {
    if is_christmas_season(date) {
        Season::Christmas
    } else if is_halloween_season(date) {
        Season::Halloween
    } else {
        Season::None
    }
}

/// Resolve the effective season: an explicit override wins over the date.
/// Unknown override values fall back to the calendar.
pub fn resolve_season(override_param: Option<&str>, date: Date) -> Season {
    match override_param.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        Some("christmas") => Season::Christmas,
        Some("halloween") => Season::Halloween,
        Some("none") | Some("off") => Season::None,
        _ => season_for_date(date),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeResponse {
    pub season: Season,
    pub greeting: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<String>,
}

pub fn theme_response(season: Season, theme: &ThemeConfig) -> ThemeResponse {
    match season {
        Season::Christmas => ThemeResponse {
            season,
            greeting: "Happy holidays!",
            stylesheet: Some(theme.christmas_stylesheet.clone()),
        },
        Season::Halloween => ThemeResponse {
            season,
            greeting: "Happy haunting!",
            stylesheet: Some(theme.halloween_stylesheet.clone()),
        },
        Season::None => ThemeResponse {
            season,
            greeting: "Welcome back.",
            stylesheet: None,
        },
    }
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn christmas_covers_all_of_december() {
        assert!(is_christmas_season(date!(2025 - 12 - 01)));
        assert!(is_christmas_season(date!(2025 - 12 - 31)));
        assert!(!is_christmas_season(date!(2025 - 11 - 30)));
        assert!(!is_christmas_season(date!(2026 - 01 - 01)));
    }

    #[test]
    fn halloween_covers_all_of_october() {
        assert!(is_halloween_season(date!(2025 - 10 - 01)));
        assert!(is_halloween_season(date!(2025 - 10 - 31)));
        assert!(!is_halloween_season(date!(2025 - 09 - 30)));
    }

    #[test]
    fn query_override_beats_the_calendar() {
        assert_eq!(
            resolve_season(Some("christmas"), date!(2025 - 06 - 15)),
            Season::Christmas
        );
        assert_eq!(
            resolve_season(Some("none"), date!(2025 - 12 - 25)),
            Season::None
        );
        assert_eq!(
            resolve_season(Some("CHRISTMAS"), date!(2025 - 06 - 15)),
            Season::Christmas
        );
    }

    #[test]
    fn unknown_override_falls_back_to_date() {
        assert_eq!(
            resolve_season(Some("summer"), date!(2025 - 12 - 25)),
            Season::Christmas
        );
        assert_eq!(resolve_season(None, date!(2025 - 06 - 15)), Season::None);
    }

    #[test]
    fn response_carries_stylesheet_only_in_season() {
        let theme = ThemeConfig {
            christmas_stylesheet: "/css/christmas.css".into(),
            halloween_stylesheet: "/css/halloween.css".into(),
        };
        let response = theme_response(Season::Christmas, &theme);
        assert_eq!(response.stylesheet.as_deref(), Some("/css/christmas.css"));
        let response = theme_response(Season::None, &theme);
        assert!(response.stylesheet.is_none());
    }
}
