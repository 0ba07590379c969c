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

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use chrono::{Datelike, Duration, NaiveDate};
use crate::common::DateBound;
use crate::parse::CannotParse;

/// Quick date ranges relative to today. Weeks start on Monday
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Preset {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    Last3Months,
    ThisYear
}

/// The range a preset selects, and the earlier period it is naturally compared with
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PresetRange {
    pub bound: DateBound,
    pub comparison: Option<DateBound>
}

impl Preset {
    pub fn values() -> impl IntoIterator<Item=Self> {
        [
            Self::Today, Self::Yesterday, Self::ThisWeek, Self::LastWeek,
            Self::ThisMonth, Self::LastMonth, Self::Last3Months, Self::ThisYear
        ]
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::ThisWeek => "thisWeek",
            Self::LastWeek => "lastWeek",
            Self::ThisMonth => "thisMonth",
            Self::LastMonth => "lastMonth",
            Self::Last3Months => "last3Months",
            Self::ThisYear => "thisYear"
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::ThisWeek => "This week",
            Self::LastWeek => "Last week",
            Self::ThisMonth => "This month",
            Self::LastMonth => "Last month",
            Self::Last3Months => "Last 3 months",
            Self::ThisYear => "This year"
        }
    }

    pub fn resolve(self, today: NaiveDate) -> PresetRange {
        let yesterday = today - Duration::days(1);
        let this_monday = monday_of(today);
        let last_monday = this_monday - Duration::days(7);
        // Comparison weeks are working weeks
        let last_friday = last_monday + Duration::days(4);
        let month_start = first_of_month(today, 0);
        let previous_month_start = first_of_month(today, 1);
        let previous_month_end = month_start - Duration::days(1);

        let (bound, comparison) = match self {
            Self::Today => (DateBound::between(today, today), Some(DateBound::between(yesterday, yesterday))),
            Self::Yesterday => (DateBound::between(yesterday, yesterday), None),
            Self::ThisWeek => (DateBound::between(this_monday, today), Some(DateBound::between(last_monday, last_friday))),
            Self::LastWeek => (DateBound::between(last_monday, last_friday), None),
            Self::ThisMonth => (
                DateBound::between(month_start, today),
                Some(DateBound::between(previous_month_start, previous_month_end))
            ),
            Self::LastMonth => (DateBound::between(previous_month_start, previous_month_end), None),
            Self::Last3Months => (DateBound::between(first_of_month(today, 2), today), None),
            Self::ThisYear => (DateBound::between(first_of_month(today, today.month0()), today), None)
        };
        PresetRange { bound, comparison }
    }
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// The first day of the month lying `months_back` months before the given date's month
fn first_of_month(date: NaiveDate, months_back: u32) -> NaiveDate {
    let months = date.year() * 12 + date.month0() as i32 - months_back as i32;
    let year = months.div_euclid(12);
    let month = months.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

impl FromStr for Preset {
    type Err = CannotParse;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::values()
            .into_iter()
            .find(|preset| preset.id().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                log::debug!("Unknown preset {}", value);
                CannotParse::simply()
            })
    }
}

impl Display for Preset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolves a preset by id. Unknown ids resolve to nothing, leaving any existing range as it is
pub fn resolve(preset_id: &str, today: NaiveDate) -> Option<PresetRange> {
    preset_id.parse::<Preset>().ok().map(|preset| preset.resolve(today))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn between(from: NaiveDate, to: NaiveDate) -> DateBound {
        DateBound::between(from, to)
    }

    fn wednesday() -> NaiveDate {
        date(2024, 3, 13)
    }

    #[test]
    fn today_and_yesterday() {
        let today = wednesday();
        assert_eq!(
            PresetRange { bound: between(today, today), comparison: Some(between(date(2024, 3, 12), date(2024, 3, 12))) },
            Preset::Today.resolve(today)
        );
        assert_eq!(
            PresetRange { bound: between(date(2024, 3, 12), date(2024, 3, 12)), comparison: None },
            Preset::Yesterday.resolve(today)
        );
    }

    #[test]
    fn this_week_starts_monday() {
        let range = Preset::ThisWeek.resolve(wednesday());
        assert_eq!(between(date(2024, 3, 11), wednesday()), range.bound);
        assert_eq!(Some(between(date(2024, 3, 4), date(2024, 3, 8))), range.comparison);
    }

    #[test]
    fn sunday_belongs_to_the_week_before() {
        let sunday = date(2024, 3, 17);
        assert_eq!(between(date(2024, 3, 11), sunday), Preset::ThisWeek.resolve(sunday).bound);
        let monday = date(2024, 3, 18);
        assert_eq!(between(monday, monday), Preset::ThisWeek.resolve(monday).bound);
    }

    #[test]
    fn last_week_is_working_week() {
        assert_eq!(
            PresetRange { bound: between(date(2024, 3, 4), date(2024, 3, 8)), comparison: None },
            Preset::LastWeek.resolve(wednesday())
        );
    }

    #[test]
    fn months() {
        let today = wednesday();
        let this_month = Preset::ThisMonth.resolve(today);
        assert_eq!(between(date(2024, 3, 1), today), this_month.bound);
        // Leap year February
        assert_eq!(Some(between(date(2024, 2, 1), date(2024, 2, 29))), this_month.comparison);
        assert_eq!(
            PresetRange { bound: between(date(2024, 2, 1), date(2024, 2, 29)), comparison: None },
            Preset::LastMonth.resolve(today)
        );
        assert_eq!(between(date(2024, 1, 1), today), Preset::Last3Months.resolve(today).bound);
        assert_eq!(between(date(2024, 1, 1), today), Preset::ThisYear.resolve(today).bound);
    }

    #[test]
    fn months_cross_year_boundaries() {
        let today = date(2024, 1, 20);
        assert_eq!(between(date(2023, 12, 1), date(2023, 12, 31)), Preset::LastMonth.resolve(today).bound);
        assert_eq!(between(date(2023, 11, 1), today), Preset::Last3Months.resolve(today).bound);
        assert_eq!(between(date(2024, 1, 1), today), Preset::ThisYear.resolve(today).bound);
    }

    #[test]
    fn preset_ids() {
        assert_eq!(Ok(Preset::Last3Months), "last3Months".parse());
        assert_eq!(Ok(Preset::ThisWeek), "thisweek".parse());
        assert_matches!("fortnight".parse::<Preset>(), Err(_));
        assert_eq!(None, resolve("fortnight", wednesday()));
        assert_matches!(resolve("today", wednesday()), Some(PresetRange { comparison: Some(_), .. }));
    }
}
