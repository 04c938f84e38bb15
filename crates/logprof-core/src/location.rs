use crate::error::ConfigError;
use crate::log::parse_timestamp;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// Time zone used to interpret timestamps written without an offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Location {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl Location {
    /// Attach this location's offset to a naive wall-clock time
    pub fn resolve(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Location::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Location::Utc => Some(Utc.from_utc_datetime(&naive).fixed_offset()),
            Location::Fixed(offset) => offset.from_local_datetime(&naive).single(),
        }
    }

    /// Parse an instant: anything with an explicit offset is taken as-is,
    /// naive date-times and bare dates are placed in this location.
    pub fn parse_instant(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        if let Some(dt) = parse_timestamp(value) {
            return Some(dt);
        }

        let value = value.trim();
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return self.resolve(naive);
            }
        }

        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|naive| self.resolve(naive))
    }
}

impl FromStr for Location {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "" | "Local" | "local" => Ok(Location::Local),
            "UTC" | "utc" | "Z" => Ok(Location::Utc),
            other => other
                .parse::<FixedOffset>()
                .map(Location::Fixed)
                .map_err(|_| ConfigError::InvalidLocation(s.to_string())),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local => f.write_str("Local"),
            Location::Utc => f.write_str("UTC"),
            Location::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        assert_eq!("Local".parse::<Location>().unwrap(), Location::Local);
        assert_eq!("UTC".parse::<Location>().unwrap(), Location::Utc);

        let tokyo = "+09:00".parse::<Location>().unwrap();
        assert_eq!(
            tokyo,
            Location::Fixed(FixedOffset::east_opt(9 * 3600).unwrap())
        );

        assert!("Mars/Olympus".parse::<Location>().is_err());
    }

    #[test]
    fn test_naive_instant_uses_location() {
        let tokyo = Location::Fixed(FixedOffset::east_opt(9 * 3600).unwrap());
        let dt = tokyo.parse_instant("2024-03-01T09:00:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T09:00:00+09:00");

        let utc = Location::Utc.parse_instant("2024-03-01").unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_explicit_offset_wins() {
        let dt = Location::Utc
            .parse_instant("2024-03-01T09:00:00+09:00")
            .unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 9 * 3600);
    }
}
