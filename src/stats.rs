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

use serde::Serialize;
use crate::common::*;

/// One point of the running total series
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub date: String,
    #[serde(flatten)]
    pub totals: MetricTotals
}

/// The row with the highest combined count
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BusiestDay {
    pub date: String,
    pub total: u64
}

/// Everything derived from one pass over the rows in range
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Aggregate {
    pub row_count: usize,
    pub totals: MetricTotals,
    pub averages: PerMetric<String>,
    pub cumulative: Vec<CumulativePoint>,
    pub busiest: Option<BusiestDay>
}

/// `total / count` to one decimal, halves rounded up
fn to_tenths(total: u64, count: u128) -> String {
    let tenths = (u128::from(total) * 20 + count) / (2 * count);
    format!("{}.{}", tenths / 10, tenths % 10)
}

fn daily_average(total: u64, row_count: usize) -> String {
    if row_count == 0 {
        String::from("0")
    } else {
        to_tenths(total, row_count as u128)
    }
}

/// Sums a range of rows in order. Bad counts read as zero and never fail the pass
pub fn aggregate<'r, I>(rows: I) -> Aggregate where I: IntoIterator<Item=&'r CanonicalRow> {
    let mut row_count = 0;
    let mut totals = MetricTotals::default();
    let mut cumulative = Vec::new();
    let mut busiest: Option<BusiestDay> = None;

    for row in rows {
        row_count += 1;
        let counts = row.metrics();
        totals.accumulate(&counts);

        let date = row.display_date();
        let combined = counts.combined();
        // Strictly greater, so the first of several equally busy days is kept
        if busiest.as_ref().map_or(true, |leader| combined > leader.total) {
            busiest = Some(BusiestDay { date: date.clone(), total: combined });
        }
        cumulative.push(CumulativePoint { date, totals });
    }
    let averages = totals.map(|_, total| daily_average(*total, row_count));
    Aggregate { row_count, totals, averages, cumulative, busiest }
}

/// Sums only, for when the series are not wanted
pub fn sum_totals<'r, I>(rows: I) -> MetricTotals where I: IntoIterator<Item=&'r CanonicalRow> {
    rows.into_iter().fold(MetricTotals::default(), |mut totals, row| {
        totals.accumulate(&row.metrics());
        totals
    })
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
    Zero
}

pub const PREVIOUS_PERIOD_ZERO: &str = "previous period had zero";

/// Change of one metric against the comparison period
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonEntry {
    /// Percentage rounded to one decimal. Absent when the previous period had nothing,
    /// in which case only the direction can be shown
    pub change: Option<f64>,
    pub sign: Sign,
    pub note: Option<&'static str>
}

fn round_to_tenth(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid showing -0.0
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub fn compare(current: u64, previous: u64) -> Option<ComparisonEntry> {
    if previous == 0 {
        return if current == 0 {
            None
        } else {
            Some(ComparisonEntry { change: None, sign: Sign::Positive, note: Some(PREVIOUS_PERIOD_ZERO) })
        };
    }
    let change = (current as f64 - previous as f64) / previous as f64 * 100.0;
    let sign = if change > 0.0 {
        Sign::Positive
    } else if change < 0.0 {
        Sign::Negative
    } else {
        Sign::Zero
    };
    Some(ComparisonEntry { change: Some(round_to_tenth(change)), sign, note: None })
}

pub fn compare_totals(current: &MetricTotals, previous: &MetricTotals) -> PerMetric<Option<ComparisonEntry>> {
    current.map(|metric, current| compare(*current, previous[metric]))
}

/// A row of the daily chart
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ChartRow {
    pub date: String,
    #[serde(flatten)]
    pub counts: MetricTotals,
    pub is_busiest: bool
}

/// Daily counts with the busiest day flagged. Every row sharing the busiest display date
/// is flagged
pub fn chart_rows(rows: &[&CanonicalRow], busiest: Option<&BusiestDay>) -> Vec<ChartRow> {
    rows.iter()
        .map(|row| {
            let date = row.display_date();
            let is_busiest = busiest.map_or(false, |busiest| busiest.date == date);
            ChartRow { date, counts: row.metrics(), is_busiest }
        })
        .collect()
}

/// One slice of the share chart
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MetricShare {
    pub metric: Metric,
    pub label: &'static str,
    pub value: u64,
    /// Share of the combined total to one decimal, `0` when nothing was counted
    pub percent: String
}

pub fn metric_shares(totals: &MetricTotals) -> Vec<MetricShare> {
    let combined = totals.combined();
    Metric::ALL
        .into_iter()
        .map(|metric| {
            let value = totals[metric];
            let percent = if combined == 0 {
                String::from("0")
            } else {
                to_tenths(value.saturating_mul(100), u128::from(combined))
            };
            MetricShare { metric, label: metric.label(), value, percent }
        })
        .collect()
}
