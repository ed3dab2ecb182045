use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Last month representable by a "MM-YYYY" token. Used as the end of an
/// open-ended subscription when computing overlaps.
pub const OPEN_ENDED: Month = Month {
    year: 9999,
    month: 12,
};

/// A calendar month, stored as its first day (UTC, no time of day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Parses a token of the exact shape `MM-YYYY`, e.g. `07-2025`.
    pub fn parse(token: &str) -> Result<Month, String> {
        let bytes = token.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[2] == b'-'
            && bytes[..2].iter().all(u8::is_ascii_digit)
            && bytes[3..].iter().all(u8::is_ascii_digit);

        if !well_formed {
            return Err(format!("{} is not a valid month, expected MM-YYYY", token));
        }

        let month: u32 = token[..2]
            .parse()
            .map_err(|_| format!("{} is not a valid month, expected MM-YYYY", token))?;
        let year: i32 = token[3..]
            .parse()
            .map_err(|_| format!("{} is not a valid month, expected MM-YYYY", token))?;

        if !(1..=12).contains(&month) || year < 1 {
            return Err(format!("{} is not a valid month, expected MM-YYYY", token));
        }

        Ok(Month { year, month })
    }

    /// Truncates any date to the month it belongs to.
    pub fn from_date(date: NaiveDate) -> Month {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        // Only constructed from valid year/month pairs, so day 1 always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

/// Number of calendar months shared by `[a_start, a_end]` and `[b_start, b_end]`,
/// both ends inclusive. A missing `a_end` extends to [`OPEN_ENDED`].
pub fn months_overlap(a_start: Month, a_end: Option<Month>, b_start: Month, b_end: Month) -> i64 {
    let a_end = a_end.unwrap_or(OPEN_ENDED);
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);

    if end < start {
        return 0;
    }

    end.ordinal() - start.ordinal() + 1
}
