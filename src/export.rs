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

use std::ffi::OsStr;
use async_std::fs::{self, OpenOptions};
use eyre::{Result, WrapErr};
use futures::AsyncWriteExt;
use crate::common::Metric;
use crate::dashboard::DashboardView;
use crate::table::TableRow;

/// Writes the table, in display order, as CSV
pub async fn write_table(destination: &OsStr, rows: &[TableRow]) -> Result<()> {
    log::info!("Writing table of {} rows to {}", rows.len(), destination.to_string_lossy());
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(destination).await
        .wrap_err_with(|| format!("While opening {}", destination.to_string_lossy()))?;
    let mut writer = csv_async::AsyncWriter::from_writer(file);

    let mut header = Vec::with_capacity(Metric::ALL.len() + 1);
    header.push("date");
    header.extend(Metric::ALL.iter().map(|metric| metric.key()));
    writer.write_record(&header).await?;

    for row in rows {
        let mut record = Vec::with_capacity(Metric::ALL.len() + 1);
        record.push(row.date.clone());
        for metric in Metric::ALL {
            record.push(row.counts[metric].to_string());
        }
        writer.write_record(&record).await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Writes the whole view as pretty JSON
pub async fn write_summary(destination: &OsStr, view: &DashboardView) -> Result<()> {
    log::info!("Writing summary to {}", destination.to_string_lossy());
    let json = serde_json::to_string_pretty(view)?;
    let mut file = fs::File::create(destination).await
        .wrap_err_with(|| format!("While creating {}", destination.to_string_lossy()))?;
    file.write_all(json.as_bytes()).await?;
    Ok(file.flush().await?)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use async_std::task;
    use crate::common::*;
    use crate::dashboard::Dashboard;
    use super::*;

    fn temp_file(name: &str) -> OsString {
        let mut path = std::env::temp_dir();
        path.push(format!("comms-dashboard-{}-{}", std::process::id(), name));
        path.into_os_string()
    }

    fn dashboard() -> Dashboard {
        let mut row = RawRow::default();
        row.populate(DATE_COLUMN, "1.2.2024");
        row.populate(Metric::Calls.column(), "3");
        row.populate(Metric::Fourth.column(), "1");
        let mut dashboard = Dashboard::default();
        dashboard.load_sheet("February", vec![row]);
        dashboard
    }

    #[test]
    fn table_as_csv() {
        let destination = temp_file("table.csv");
        let view = dashboard().view();
        task::block_on(write_table(&destination, &view.table)).unwrap();
        let written = std::fs::read_to_string(&destination).unwrap();
        std::fs::remove_file(&destination).unwrap();
        assert_eq!("date,calls,emails,efilings,fourth\n01/02/2024,3,0,0,1\n", written);
    }

    #[test]
    fn summary_as_json() {
        let destination = temp_file("summary.json");
        let view = dashboard().view();
        task::block_on(write_summary(&destination, &view)).unwrap();
        let written = std::fs::read_to_string(&destination).unwrap();
        std::fs::remove_file(&destination).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(3, json["aggregate"]["totals"]["calls"]);
        assert_eq!("01/02/2024", json["aggregate"]["busiest"]["date"]);
        assert_eq!("February", json["sheet_name"]);
    }
}
