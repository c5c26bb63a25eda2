//! The shared filter predicate applied by every ranking tier and by hybrid
//! search.

use catalog::Movie;

/// Caller-supplied filter predicate.
///
/// Semantics, shared across all tiers:
/// - `genre`: case-insensitive substring match against the joined genre field
/// - `language`: exact ISO-code match
/// - `adult`: exact flag match when requested
/// - `year_start`/`year_end`: inclusive bounds against the release year
///
/// A record whose `release_date` has no parsable leading year fails any year
/// bound but passes when no year filter is requested.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub genre: Option<String>,
    pub language: Option<String>,
    pub year_start: Option<i32>,
    pub year_end: Option<i32>,
    pub adult: Option<bool>,
}

impl Filters {
    /// True when no filter field is set.
    pub fn is_empty(&self) -> bool {
        self.genre.is_none()
            && self.language.is_none()
            && self.year_start.is_none()
            && self.year_end.is_none()
            && self.adult.is_none()
    }

    /// Whether `movie` satisfies every requested filter.
    pub fn matches(&self, movie: &Movie) -> bool {
        if let Some(genre) = &self.genre {
            if !movie.genres.to_lowercase().contains(&genre.to_lowercase()) {
                return false;
            }
        }

        if let Some(language) = &self.language {
            if &movie.original_language != language {
                return false;
            }
        }

        if let Some(adult) = self.adult {
            if movie.adult != adult {
                return false;
            }
        }

        if self.year_start.is_some() || self.year_end.is_some() {
            let Some(year) = release_year(movie) else {
                // Unparsable or empty date cannot satisfy a year bound
                return false;
            };
            if let Some(start) = self.year_start {
                if year < start {
                    return false;
                }
            }
            if let Some(end) = self.year_end {
                if year > end {
                    return false;
                }
            }
        }

        true
    }
}

/// Release year parsed from the leading 4 characters of `release_date`.
///
/// Explicitly optional: malformed input is an absent year, never a panic or
/// a swallowed exception.
pub fn release_year(movie: &Movie) -> Option<i32> {
    movie.release_date.get(..4)?.parse().ok()
}
