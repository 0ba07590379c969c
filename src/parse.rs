/*
 * comms-dashboard
 * Copyright © 2023 Centre for Policy Dialogue
 *
 * comms-dashboard is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * comms-dashboard is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with comms-dashboard. If not, see <https://www.gnu.org/licenses/>
 * and navigate to version 3 of the GNU General Public License.
 */


// Parsing

use std::str::FromStr;
use std::sync::OnceLock;
use chrono::{Duration, NaiveDate};
use regex::{Captures, Regex};
use crate::common::*;

#[derive(Debug, PartialEq, Eq)]
pub struct CannotParse(());

impl CannotParse {
    pub(crate) fn simply() -> Self {
        Self(())
    }
}

impl<E> From<E> for CannotParse where E: std::error::Error + Send + Sync + 'static {
    fn from(_error: E) -> Self {
        Self(())
    }
}

macro_rules! impl_from_str_with_pat {
    ($strct:ty, $pat_constant:ident, $pat:literal, $create_from_captures:ident, $tests_module:ident) => {

        static $pat_constant: OnceLock<Regex> = OnceLock::new();

        impl FromStr for $strct {
            type Err = CannotParse;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let pattern = $pat_constant.get_or_init(||
                    Regex::new($pat).expect("Regex compilation failure")
                );
                match pattern.captures(value) {
                    Some(captures) => $create_from_captures(&captures),
                    None => Err(CannotParse::simply())
                }
            }
        }

        #[cfg(test)]
        mod $tests_module {
            use super::*;
            #[test]
            fn pattern_validation() {
                // Test for non-panicking pattern
                let _res: Result<$strct, CannotParse> = "".parse();
            }
        }
    }
}

fn capture<T: FromStr>(captures: &Captures<'_>, index: usize) -> Result<T, CannotParse> {
    captures.get(index)
        .ok_or_else(CannotParse::simply)?
        .as_str()
        .parse()
        .map_err(|_| CannotParse::simply())
}

/// Day and month fields are kept as written; they are only validated when a calendar
/// date is requested
fn pad_fields(day: u32, month: u32, year: i32) -> String {
    format!("{:02}/{:02}/{}", day, month, year)
}

/// Out-of-range fields carry over the way spreadsheets do: month 13 is January of the
/// next year, day 0 is the last day of the month before
fn calendar_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
        return Some(date);
    }
    let months = i64::from(year) * 12 + i64::from(month) - 1;
    let first_of_month = NaiveDate::from_ymd_opt(
        i32::try_from(months.div_euclid(12)).ok()?,
        u32::try_from(months.rem_euclid(12) + 1).ok()?,
        1
    )?;
    let date = first_of_month.checked_add_signed(Duration::days(i64::from(day) - 1))?;
    log::debug!("Date fields {}.{}.{} carried over to {}", day, month, year, date);
    Some(date)
}

/// US-style short date, `M/D/YY`. Always in the 21st century
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ShortDate {
    pub month: u32,
    pub day: u32,
    pub year: i32
}

fn impl_parse_short_date(captures: &Captures<'_>) -> Result<ShortDate, CannotParse> {
    let short_year: i32 = capture(captures, 3)?;
    Ok(ShortDate {
        month: capture(captures, 1)?,
        day: capture(captures, 2)?,
        year: 2000 + short_year
    })
}

impl_from_str_with_pat!(
    ShortDate, SHORT_DATE_PATTERN, "^([0-9]{1,2})/([0-9]{1,2})/([0-9]{2})$", impl_parse_short_date, test_short_date_from_str
);

/// European long date, `D.M.YYYY` or `D/M/YYYY`. Day comes first, unlike [ShortDate]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LongDate {
    pub day: u32,
    pub month: u32,
    pub year: i32
}

fn impl_parse_long_date(captures: &Captures<'_>) -> Result<LongDate, CannotParse> {
    Ok(LongDate {
        day: capture(captures, 1)?,
        month: capture(captures, 2)?,
        year: capture(captures, 3)?
    })
}

impl_from_str_with_pat!(
    LongDate, LONG_DATE_PATTERN, "^([0-9]{1,2})[/.]([0-9]{1,2})[/.]([0-9]{4})$", impl_parse_long_date, test_long_date_from_str
);

/// Day and month with the year left out, `D.M` or `D/M`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PartialDate {
    pub day: u32,
    pub month: u32
}

fn impl_parse_partial_date(captures: &Captures<'_>) -> Result<PartialDate, CannotParse> {
    Ok(PartialDate {
        day: capture(captures, 1)?,
        month: capture(captures, 2)?
    })
}

impl_from_str_with_pat!(
    PartialDate, PARTIAL_DATE_PATTERN, "^([0-9]{1,2})[/.]([0-9]{1,2})$", impl_parse_partial_date, test_partial_date_from_str
);

impl ShortDate {
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        calendar_date(self.year, self.month, self.day)
    }

    pub fn canonical(&self) -> String {
        pad_fields(self.day, self.month, self.year)
    }
}

impl LongDate {
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        calendar_date(self.year, self.month, self.day)
    }

    pub fn canonical(&self) -> String {
        pad_fields(self.day, self.month, self.year)
    }
}

impl PartialDate {
    pub fn with_year(&self, year: i32) -> LongDate {
        LongDate { day: self.day, month: self.month, year }
    }
}

/// Spreadsheet serials at or below this are not treated as dates
const MIN_DATE_SERIAL: f64 = 40000.0;
/// 9999-12-31, the last date spreadsheets can represent
const MAX_DATE_SERIAL: f64 = 2958465.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Reads a spreadsheet date serial as a calendar date. Any time of day is dropped
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial > MAX_DATE_SERIAL {
        return None;
    }
    let offset = Duration::milliseconds((serial * MILLIS_PER_DAY).trunc() as i64);
    let instant = serial_epoch()?.and_hms_opt(0, 0, 0)?.checked_add_signed(offset)?;
    Some(instant.date())
}

/// A date cell, sorted into the shape it was written in
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DateCell {
    /// Contains the exclusion marker
    Excluded,
    Short(ShortDate),
    Long(LongDate),
    Partial(PartialDate),
    Serial(f64),
    Unrecognized
}

fn contains_exclusion_marker(value: &str) -> bool {
    value.contains('X') || value.contains('x')
}

/// Whether the cell carries the marker flagging the row as excluded
pub fn is_excluded(cell: &CellValue) -> bool {
    contains_exclusion_marker(cell.as_text().trim())
}

fn as_serial(cell: &CellValue) -> Option<f64> {
    let number = match cell {
        CellValue::Empty => return None,
        CellValue::Number(number) => *number,
        CellValue::Text(text) => text.trim().parse::<f64>().ok()?
    };
    (number.is_finite() && number > MIN_DATE_SERIAL).then_some(number)
}

impl DateCell {
    /// Shapes are tried in a fixed order, first match wins. The exclusion marker beats
    /// everything else, even an otherwise valid number
    pub fn classify(cell: &CellValue) -> Self {
        let text = cell.as_text();
        let text = text.trim();
        if contains_exclusion_marker(text) {
            return Self::Excluded;
        }
        if let Ok(short) = ShortDate::from_str(text) {
            return Self::Short(short);
        }
        if let Ok(long) = LongDate::from_str(text) {
            return Self::Long(long);
        }
        if let Ok(partial) = PartialDate::from_str(text) {
            return Self::Partial(partial);
        }
        if let Some(serial) = as_serial(cell) {
            return Self::Serial(serial);
        }
        Self::Unrecognized
    }

    pub fn calendar_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Short(short) => short.calendar_date(),
            Self::Long(long) => long.calendar_date(),
            Self::Serial(serial) => serial_to_date(*serial),
            Self::Excluded | Self::Partial(_) | Self::Unrecognized => None
        }
    }
}

/// Resolves a date cell to a calendar date, if it is one
pub fn normalize(cell: &CellValue) -> Option<NaiveDate> {
    DateCell::classify(cell).calendar_date()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// How a date cell is shown: `DD/MM/YYYY`, or `-` when it is not a date
pub fn display(cell: &CellValue) -> String {
    match normalize(cell) {
        Some(date) => format_date(date),
        None => String::from("-")
    }
}

/// Reads a count the permissive way: the leading integer of the cell, or zero
pub fn parse_metric(cell: &CellValue) -> u64 {
    match cell {
        CellValue::Empty => 0,
        CellValue::Number(number) => {
            if number.is_finite() && *number > 0.0 {
                number.trunc() as u64
            } else {
                0
            }
        },
        CellValue::Text(text) => {
            let text = text.trim_start();
            let (negative, digits) = match text.as_bytes().first() {
                Some(b'-') => (true, &text[1..]),
                Some(b'+') => (false, &text[1..]),
                _ => (false, text)
            };
            let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
            if negative {
                return 0;
            }
            digits[..end].parse::<u64>().unwrap_or_else(|_| {
                // Overflowing runs of digits saturate rather than vanish
                if end > 0 { u64::MAX } else { 0 }
            })
        }
    }
}

/// Parses a date typed by the user, `YYYY-MM-DD`. Blank input means no bound
pub fn parse_user_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

impl FromStr for Metric {
    type Err = CannotParse;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Metric::ALL
            .into_iter()
            .find(|metric| metric.key().eq_ignore_ascii_case(value) || metric.column().eq_ignore_ascii_case(value))
            .ok_or_else(CannotParse::simply)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(value: &str) -> CellValue {
        CellValue::from(value)
    }

    #[test]
    fn long_dates_are_day_first() {
        assert_eq!(Some(date(2024, 3, 1)), normalize(&text("1.3.2024")));
        assert_eq!(Some(date(2024, 3, 1)), normalize(&text("1/3/2024")));
        assert_eq!(Some(date(2024, 12, 31)), normalize(&text(" 31.12.2024 ")));
        assert_eq!("01/03/2024", display(&text("1.3.2024")));
    }

    #[test]
    fn short_dates_are_month_first() {
        assert_eq!(Some(date(2024, 1, 3)), normalize(&text("1/3/24")));
        assert_eq!(Some(date(2005, 12, 25)), normalize(&text("12/25/05")));
        assert_eq!("03/01/2024", display(&text("1/3/24")));
    }

    #[test]
    fn exclusion_marker_wins() {
        assert_eq!(None, normalize(&text("X")));
        assert_eq!(None, normalize(&text("12x")));
        assert_eq!(None, normalize(&text("1.3.2024 x")));
        assert_eq!(None, normalize(&text("45000X")));
        assert_eq!("-", display(&text("x")));
        assert!(is_excluded(&text(" X ")));
        assert!(!is_excluded(&CellValue::Number(45000.0)));
    }

    #[test]
    fn spreadsheet_serials() {
        assert_eq!(Some(date(2023, 3, 15)), normalize(&CellValue::Number(45000.0)));
        assert_eq!(Some(date(2023, 3, 15)), normalize(&text("45000")));
        // Time of day is dropped
        assert_eq!(Some(date(2023, 3, 15)), normalize(&CellValue::Number(45000.75)));
        assert_eq!(Some(date(2024, 1, 1)), normalize(&CellValue::Number(45292.0)));
        assert_eq!(None, normalize(&CellValue::Number(40000.0)));
        assert_eq!(None, normalize(&CellValue::Number(12.0)));
        assert_eq!(None, normalize(&text("inf")));
        assert_eq!(None, normalize(&CellValue::Number(1e12)));
    }

    #[test]
    fn unrecognized_dates() {
        assert_eq!(None, normalize(&CellValue::Empty));
        assert_eq!(None, normalize(&text("")));
        assert_eq!(None, normalize(&text("Monday")));
        assert_eq!(None, normalize(&text("2024-01-05")));
        assert_eq!(None, normalize(&text("1.3.24")));
        assert_eq!("-", display(&text("Monday")));
        assert_eq!("-", display(&CellValue::Empty));
    }

    #[test]
    fn out_of_range_fields_carry_over() {
        assert_eq!(NaiveDate::from_ymd_opt(2024, 3, 2), normalize(&text("31.2.2024")));
        assert_eq!(NaiveDate::from_ymd_opt(2025, 1, 1), normalize(&text("13/1/24")));
        assert_eq!("30/11/2023", display(&text("0.0.2024")));
        assert_eq!("01/01/2025", display(&text("32/12/2024")));
    }

    #[test]
    fn year_less_dates_need_context() {
        assert_matches!(DateCell::classify(&text("4.1")), DateCell::Partial(PartialDate { day: 4, month: 1 }));
        assert_matches!(DateCell::classify(&text("4/1")), DateCell::Partial(_));
        assert_eq!(None, normalize(&text("4.1")));
    }

    #[test]
    fn classification_order() {
        assert_matches!(DateCell::classify(&text("1/2/24")), DateCell::Short(_));
        assert_matches!(DateCell::classify(&text("1/2/2024")), DateCell::Long(_));
        assert_matches!(DateCell::classify(&text("45000")), DateCell::Serial(_));
        assert_matches!(DateCell::classify(&text("x45000")), DateCell::Excluded);
        assert_matches!(DateCell::classify(&text("39999")), DateCell::Unrecognized);
    }

    #[test]
    fn permissive_metrics() {
        assert_eq!(5, parse_metric(&text("5")));
        assert_eq!(12, parse_metric(&text(" 12 calls")));
        assert_eq!(3, parse_metric(&text("3.9")));
        assert_eq!(3, parse_metric(&CellValue::Number(3.9)));
        assert_eq!(0, parse_metric(&text("")));
        assert_eq!(0, parse_metric(&text("n/a")));
        assert_eq!(0, parse_metric(&text("-4")));
        assert_eq!(0, parse_metric(&CellValue::Number(-4.0)));
        assert_eq!(0, parse_metric(&CellValue::Number(f64::NAN)));
        assert_eq!(0, parse_metric(&CellValue::Empty));
        assert_eq!(7, parse_metric(&text("+7")));
    }

    #[test]
    fn user_dates() {
        assert_eq!(Some(date(2024, 2, 29)), parse_user_date("2024-02-29"));
        assert_eq!(None, parse_user_date(""));
        assert_eq!(None, parse_user_date("29/02/2024"));
    }

    #[test]
    fn parse_metric_names() {
        assert_eq!(Ok(Metric::Calls), "calls".parse());
        assert_eq!(Ok(Metric::EFilings), "E".parse());
        assert_eq!(Ok(Metric::Fourth), " Fourth ".parse());
        assert_matches!("faxes".parse::<Metric>(), Err(_));
    }
}
