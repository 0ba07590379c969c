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

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use crate::common::*;
use crate::parse::{self, DateCell};

/// The year carried from one row to the next while dates are canonicalized.
///
/// Sheets in this domain usually spell out the full date only on the first row of each
/// year or section. Later rows give a bare day and month which refer back to the last
/// year seen, so rows must be visited strictly in order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct YearCarry {
    current_year: Option<i32>
}

impl YearCarry {
    pub fn current_year(&self) -> Option<i32> {
        self.current_year
    }

    /// Works out the canonical form of a date cell, if it gets one, along with the
    /// carry for the following row
    fn rewrite(self, cell: &CellValue) -> (Self, Option<String>) {
        if cell.is_blank() {
            return (self, None);
        }
        let carry_year = |year: i32| Self { current_year: Some(year) };
        match DateCell::classify(cell) {
            // Left alone. Excluded rows are dropped at ingestion, not here
            DateCell::Excluded => (self, None),
            DateCell::Short(short) => (carry_year(short.year), Some(short.canonical())),
            DateCell::Long(long) => (carry_year(long.year), Some(long.canonical())),
            DateCell::Partial(partial) => match self.current_year {
                Some(year) => (self, Some(partial.with_year(year).canonical())),
                None => (self, None)
            },
            // A serial only anchors the year when nothing has done so yet
            DateCell::Serial(serial) if self.current_year.is_none() => {
                match parse::serial_to_date(serial) {
                    Some(date) => (carry_year(date.year()), Some(parse::format_date(date))),
                    None => (self, None)
                }
            },
            DateCell::Serial(_) | DateCell::Unrecognized => (self, None)
        }
    }

    pub fn canonicalize(self, mut row: RawRow) -> (Self, CanonicalRow) {
        let (next, rewritten) = self.rewrite(row.date_cell());
        if let Some(rewritten) = rewritten {
            log::trace!("Rewrote date {} as {}", row.date_cell(), rewritten);
            row.populate(DATE_COLUMN, rewritten);
        }
        (next, CanonicalRow::new(row))
    }
}

/// Fills in missing years and canonicalizes every date cell. Row order is preserved
pub fn fill_years<I>(rows: I) -> Vec<CanonicalRow> where I: IntoIterator<Item=RawRow> {
    let (carry, canonical) = rows.into_iter().fold(
        (YearCarry::default(), Vec::new()),
        |(carry, mut canonical), row| {
            let (carry, row) = carry.canonicalize(row);
            canonical.push(row);
            (carry, canonical)
        }
    );
    log::debug!("Canonicalized {} rows, last year seen {:?}", canonical.len(), carry.current_year());
    canonical
}

impl CanonicalRow {
    pub fn date(&self) -> Option<NaiveDate> {
        parse::normalize(self.date_cell())
    }

    pub fn display_date(&self) -> String {
        parse::display(self.date_cell())
    }

    pub fn metric(&self, metric: Metric) -> u64 {
        parse::parse_metric(self.metric_cell(metric))
    }

    pub fn metrics(&self) -> MetricTotals {
        MetricTotals::from_fn(|metric| self.metric(metric))
    }
}

/// Keeps the rows dated inside the bound, in their original order. Rows without a
/// date are always dropped
pub fn filter_range<'r, I>(rows: I, bound: &DateBound) -> Vec<&'r CanonicalRow>
    where I: IntoIterator<Item=&'r CanonicalRow> {

    rows.into_iter()
        .filter(|row| row.date().map_or(false, |date| bound.contains(date)))
        .collect()
}

/// The earliest and latest dates present in a sheet
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct DateSpan {
    pub first: NaiveDate,
    pub last: NaiveDate
}

pub fn data_span<'r, I>(rows: I) -> Option<DateSpan> where I: IntoIterator<Item=&'r CanonicalRow> {
    rows.into_iter()
        .filter_map(CanonicalRow::date)
        .fold(None, |span, date| Some(match span {
            None => DateSpan { first: date, last: date },
            Some(DateSpan { first, last }) => DateSpan {
                first: first.min(date),
                last: last.max(date)
            }
        }))
}
