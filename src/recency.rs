use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Utc};

/// Coarse age category of a game, used as the leading prompt tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecencyBucket {
    Newest,
    Recent,
    Mid,
    Early,
    Oldest,
}

const NEWEST_FROM: i32 = 2021;

impl RecencyBucket {
    pub const ALL: [RecencyBucket; 5] = [
        RecencyBucket::Newest,
        RecencyBucket::Recent,
        RecencyBucket::Mid,
        RecencyBucket::Early,
        RecencyBucket::Oldest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Recent => "recent",
            Self::Mid => "mid",
            Self::Early => "early",
            Self::Oldest => "oldest",
        }
    }

    /// Inclusive year range of the bucket; `newest` ends at `current_year`.
    pub fn years(self, current_year: i32) -> RangeInclusive<i32> {
        match self {
            Self::Newest => NEWEST_FROM..=current_year.max(NEWEST_FROM),
            Self::Recent => 2018..=2020,
            Self::Mid => 2015..=2017,
            Self::Early => 2011..=2014,
            Self::Oldest => 2005..=2010,
        }
    }

    pub fn for_year(year: i32, current_year: i32) -> Self {
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.years(current_year).contains(&year))
            .unwrap_or(Self::Oldest)
    }

    /// Buckets a release timestamp (epoch seconds). Undated games carry 0,
    /// which lands in 1970 and therefore in `oldest`.
    pub fn from_release_timestamp(timestamp: i64) -> Self {
        let current_year = Utc::now().year();
        let year = DateTime::<Utc>::from_timestamp(timestamp, 0)
            .map(|date| date.year())
            .unwrap_or(1970);
        Self::for_year(year, current_year)
    }
}

impl fmt::Display for RecencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn years_map_to_their_buckets() {
        assert_eq!(RecencyBucket::for_year(2026, 2026), RecencyBucket::Newest);
        assert_eq!(RecencyBucket::for_year(2021, 2026), RecencyBucket::Newest);
        assert_eq!(RecencyBucket::for_year(2019, 2026), RecencyBucket::Recent);
        assert_eq!(RecencyBucket::for_year(2015, 2026), RecencyBucket::Mid);
        assert_eq!(RecencyBucket::for_year(2014, 2026), RecencyBucket::Early);
        assert_eq!(RecencyBucket::for_year(2005, 2026), RecencyBucket::Oldest);
    }

    #[test]
    fn years_outside_every_range_fall_into_oldest() {
        assert_eq!(RecencyBucket::for_year(1998, 2026), RecencyBucket::Oldest);
        assert_eq!(RecencyBucket::for_year(2031, 2026), RecencyBucket::Oldest);
    }

    #[test]
    fn ranges_partition_the_timeline_without_gaps() {
        let current_year = 2026;
        for year in 2005..=current_year {
            let matching = RecencyBucket::ALL
                .into_iter()
                .filter(|bucket| bucket.years(current_year).contains(&year))
                .count();
            assert_eq!(matching, 1, "year {year} matched {matching} buckets");
        }
    }

    #[test]
    fn newest_tracks_the_current_year() {
        assert_eq!(RecencyBucket::for_year(2030, 2030), RecencyBucket::Newest);
        let this_year = Utc::now().year();
        assert!(RecencyBucket::Newest.years(this_year).contains(&this_year));
    }

    #[test]
    fn release_timestamps_are_bucketed_by_year() {
        // 2015-02-18
        assert_eq!(
            RecencyBucket::from_release_timestamp(1_424_217_600),
            RecencyBucket::Mid
        );
        assert_eq!(RecencyBucket::from_release_timestamp(0), RecencyBucket::Oldest);
        assert_eq!(
            RecencyBucket::from_release_timestamp(Utc::now().timestamp()),
            RecencyBucket::Newest
        );
    }
}
