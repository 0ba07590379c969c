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

use chrono::NaiveDate;
use serde::Serialize;
use crate::analysis::{self, DateSpan};
use crate::common::*;
use crate::parse;
use crate::presets::{Preset, PresetRange};
use crate::stats::{self, Aggregate, ChartRow, ComparisonEntry, MetricShare};
use crate::table::{self, SortConfig, SortKey, TableRow};

/// What the user has selected, and the canonical rows of the current sheet.
///
/// Nothing derived is stored here. Every figure is recomputed from scratch by [Dashboard::view]
#[derive(Clone, Debug)]
pub struct Dashboard {
    sheet_name: Option<String>,
    rows: Vec<CanonicalRow>,
    date_from: String,
    date_to: String,
    active_preset: Option<Preset>,
    comparison: Option<DateBound>,
    sort: SortConfig,
    visible: PerMetric<bool>
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            sheet_name: None,
            rows: Vec::new(),
            date_from: String::new(),
            date_to: String::new(),
            active_preset: None,
            comparison: None,
            sort: SortConfig::default(),
            visible: PerMetric::from_fn(|_| true)
        }
    }
}

/// Everything displayed for the current selection
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub sheet_name: Option<String>,
    pub span: Option<DateSpan>,
    pub bound: DateBound,
    pub comparison_bound: Option<DateBound>,
    pub aggregate: Aggregate,
    pub comparison_totals: Option<MetricTotals>,
    pub comparison: Option<PerMetric<Option<ComparisonEntry>>>,
    pub shares: Vec<MetricShare>,
    pub chart: Vec<ChartRow>,
    pub table: Vec<TableRow>,
    pub visible: PerMetric<bool>
}

impl DashboardView {
    /// The range excluded every row
    pub fn is_empty(&self) -> bool {
        self.aggregate.row_count == 0
    }
}

impl Dashboard {
    /// Switches to another sheet. The date range starts over
    pub fn load_sheet<I>(&mut self, sheet_name: &str, raw_rows: I) where I: IntoIterator<Item=RawRow> {
        self.rows = analysis::fill_years(raw_rows);
        self.sheet_name = Some(sheet_name.to_string());
        self.date_from.clear();
        self.date_to.clear();
        log::info!("Selected sheet {} with {} rows", sheet_name, self.rows.len());
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.sheet_name.as_deref()
    }

    /// Typed start date, `YYYY-MM-DD`. Blank clears it. The comparison period stays
    pub fn set_date_from(&mut self, value: &str) {
        self.date_from = value.trim().to_string();
    }

    pub fn set_date_to(&mut self, value: &str) {
        self.date_to = value.trim().to_string();
    }

    /// Applies a preset by id. Unknown ids change nothing and yield false
    pub fn apply_preset(&mut self, preset_id: &str, today: NaiveDate) -> bool {
        match preset_id.parse::<Preset>() {
            Ok(preset) => {
                self.select_preset(preset, today);
                true
            },
            Err(_) => false
        }
    }

    pub fn select_preset(&mut self, preset: Preset, today: NaiveDate) {
        let PresetRange { bound, comparison } = preset.resolve(today);
        self.active_preset = Some(preset);
        self.date_from = bound.from.map(iso_date).unwrap_or_default();
        self.date_to = bound.to.map(iso_date).unwrap_or_default();
        self.comparison = comparison;
    }

    pub fn active_preset(&self) -> Option<Preset> {
        self.active_preset
    }

    /// Back to the whole sheet, with no comparison
    pub fn reset_range(&mut self) {
        self.date_from.clear();
        self.date_to.clear();
        self.active_preset = None;
        self.comparison = None;
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort = self.sort.toggle(key);
    }

    pub fn sort(&self) -> SortConfig {
        self.sort
    }

    /// Visibility only affects what is drawn, never the figures
    pub fn toggle_metric(&mut self, metric: Metric) {
        self.visible[metric] = !self.visible[metric];
    }

    /// The selected range. Text which is not a date leaves that end open
    pub fn bound(&self) -> DateBound {
        DateBound {
            from: parse::parse_user_date(&self.date_from),
            to: parse::parse_user_date(&self.date_to)
        }
    }

    pub fn comparison_bound(&self) -> Option<DateBound> {
        self.comparison
    }

    pub fn view(&self) -> DashboardView {
        let bound = self.bound();
        let in_range = analysis::filter_range(&self.rows, &bound);
        let aggregate = stats::aggregate(in_range.iter().copied());

        // Compared against the whole sheet, not the rows currently in range
        let comparison_totals = self.comparison
            .map(|comparison| stats::sum_totals(analysis::filter_range(&self.rows, &comparison)));
        let comparison = comparison_totals
            .as_ref()
            .map(|previous| stats::compare_totals(&aggregate.totals, previous));

        let chart = stats::chart_rows(&in_range, aggregate.busiest.as_ref());
        let table = table::sort_rows(&in_range, self.sort)
            .into_iter()
            .map(TableRow::from)
            .collect();
        DashboardView {
            sheet_name: self.sheet_name.clone(),
            span: analysis::data_span(&self.rows),
            bound,
            comparison_bound: self.comparison,
            shares: stats::metric_shares(&aggregate.totals),
            aggregate,
            comparison_totals,
            comparison,
            chart,
            table,
            visible: self.visible
        }
    }
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
