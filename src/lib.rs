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

//! Daily communication counts kept in spreadsheets: dates canonicalized, ranges
//! filtered, totals and trends derived.

pub mod common;
pub mod parse;
pub mod analysis;
pub mod stats;
pub mod presets;
pub mod table;
pub mod workbook;
pub mod dashboard;
pub mod export;
