//! Year selection and year-page URL parsing

use std::fmt;
use std::str::FromStr;

use url::Url;

/// First proceedings year in the archive
pub const MIN_YEAR: i32 = 1987;

/// Last proceedings year this crawler knows the page layout for
pub const MAX_YEAR: i32 = 2023;

/// Most years one run may select
pub const MAX_SELECTED: usize = 5;

/// Why a year selection was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearSelectionError {
    Empty,
    TooMany(usize),
    NotANumber(String),
    OutOfRange(i32),
}

impl fmt::Display for YearSelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no years given"),
            Self::TooMany(n) => {
                write!(f, "{n} years given; select at most {MAX_SELECTED} at a time")
            }
            Self::NotANumber(s) => write!(f, "'{s}' is not a year"),
            Self::OutOfRange(y) => {
                write!(f, "year {y} is out of range ({MIN_YEAR}-{MAX_YEAR})")
            }
        }
    }
}

impl std::error::Error for YearSelectionError {}

/// Up to [`MAX_SELECTED`] distinct years in `MIN_YEAR..=MAX_YEAR`, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSelection {
    years: Vec<i32>,
}

impl YearSelection {
    /// Validate `years`, dropping repeats (first occurrence wins)
    pub fn new(years: impl IntoIterator<Item = i32>) -> Result<Self, YearSelectionError> {
        let mut distinct = Vec::new();
        for year in years {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(YearSelectionError::OutOfRange(year));
            }
            if !distinct.contains(&year) {
                distinct.push(year);
            }
        }
        match distinct.len() {
            0 => Err(YearSelectionError::Empty),
            n if n > MAX_SELECTED => Err(YearSelectionError::TooMany(n)),
            _ => Ok(Self { years: distinct }),
        }
    }

    /// Parse comma-separated years, e.g. `"2019, 2021,2023"`
    pub fn parse(input: &str) -> Result<Self, YearSelectionError> {
        let years = input
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i32>()
                    .map_err(|_| YearSelectionError::NotANumber(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(years)
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years.contains(&year)
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.years
    }
}

impl FromStr for YearSelection {
    type Err = YearSelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for YearSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.years.iter().map(i32::to_string).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Year-page URL whose last path segment is not an integer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSegmentError {
    pub url: String,
}

impl fmt::Display for YearSegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no year in last path segment of {}", self.url)
    }
}

impl std::error::Error for YearSegmentError {}

/// Year encoded in the trailing path segment, e.g. `/paper_files/paper/2019` → 2019
pub fn year_from_url(url: &Url) -> Result<i32, YearSegmentError> {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .and_then(|segment| segment.parse().ok())
        .ok_or_else(|| YearSegmentError {
            url: url.to_string(),
        })
}
