use chrono::{Datelike, Local, NaiveDate};

pub const WEEKDAY_LABELS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One cell of the month grid: leading blanks before the 1st, then one
/// cell per day of the month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Day { day: u32, key: String },
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn make_key(year: i32, month: u32, day: u32) -> String {
    format!("{year:04}-{month:02}-{day:02}")
}

/// Key for the current local calendar day.
pub fn today_key() -> String {
    date_key(Local::now().date_naive())
}

pub fn parse_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// Number of days in a month (1-based), leap years included.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 0,
    }
}

/// Weekday of the 1st of the month, 0 = Sunday .. 6 = Saturday.
pub fn first_weekday(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.weekday().num_days_from_sunday())
        .unwrap_or(0)
}

/// The calendar grid for a month: `first_weekday` empty cells so the 1st
/// lands in its weekday column, then a cell per day. Cheap enough to
/// rebuild from scratch on every month change.
pub fn month_grid(year: i32, month: u32) -> Vec<Cell> {
    let offset = first_weekday(year, month);
    let days = days_in_month(year, month);
    let mut cells = Vec::with_capacity((offset + days) as usize);
    for _ in 0..offset {
        cells.push(Cell::Empty);
    }
    for day in 1..=days {
        cells.push(Cell::Day {
            day,
            key: make_key(year, month, day),
        });
    }
    cells
}

pub fn is_weekend(year: i32, month: u32, day: u32) -> bool {
    let weekday = (first_weekday(year, month) + day - 1) % 7;
    weekday == 0 || weekday == 6
}

pub fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_in_month_handles_lengths_and_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 1), 31);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
    }

    #[test]
    fn first_weekday_is_sunday_based() {
        // 2024-03-01 was a Friday
        assert_eq!(first_weekday(2024, 3), 5);
        // 2023-01-01 was a Sunday
        assert_eq!(first_weekday(2023, 1), 0);
    }

    #[test]
    fn grid_has_offset_plus_days_cells() {
        for (year, month) in [(2024, 2), (2023, 1), (2024, 12), (2021, 7)] {
            let grid = month_grid(year, month);
            let offset = first_weekday(year, month) as usize;
            let days = days_in_month(year, month) as usize;
            assert_eq!(grid.len(), offset + days);
            let day_cells = grid
                .iter()
                .filter(|c| matches!(c, Cell::Day { .. }))
                .count();
            assert_eq!(day_cells, days);
            assert!(grid[..offset].iter().all(|c| *c == Cell::Empty));
        }
    }

    #[test]
    fn grid_keys_are_zero_padded() {
        let grid = month_grid(2024, 3);
        let Some(Cell::Day { day, key }) = grid.iter().find(|c| matches!(c, Cell::Day { .. }))
        else {
            panic!("grid has no day cells");
        };
        assert_eq!(*day, 1);
        assert_eq!(key, "2024-03-01");
    }

    #[test]
    fn weekend_matches_weekday_columns() {
        // 2024-03-02 Saturday, 2024-03-03 Sunday, 2024-03-04 Monday
        assert!(is_weekend(2024, 3, 2));
        assert!(is_weekend(2024, 3, 3));
        assert!(!is_weekend(2024, 3, 4));
    }

    #[test]
    fn month_stepping_wraps_years() {
        assert_eq!(prev_month(2024, 1), (2023, 12));
        assert_eq!(next_month(2024, 12), (2025, 1));
        assert_eq!(prev_month(2024, 6), (2024, 5));
        assert_eq!(next_month(2024, 6), (2024, 7));
    }

    #[test]
    fn date_keys_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let key = date_key(date);
        assert_eq!(key, "2024-03-15");
        assert_eq!(parse_key(&key), Some(date));
        assert_eq!(parse_key("not-a-date"), None);
    }
}
