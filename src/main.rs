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

use std::env;
use std::ffi::OsString;
use async_std::path::PathBuf;
use async_std::{io, io::WriteExt, task};
use chrono::{Local, NaiveDate};
use comms_dashboard::common::Metric;
use comms_dashboard::dashboard::{Dashboard, DashboardView};
use comms_dashboard::presets::Preset;
use comms_dashboard::stats::{ComparisonEntry, Sign};
use comms_dashboard::table::SortKey;
use comms_dashboard::workbook::{self, Workbook};
use comms_dashboard::{export, parse};
use eyre::Result;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TerminalMode, TermLogger};

/// Rows of the table printed to the console. Exports carry all of them
const TABLE_PREVIEW_ROWS: usize = 10;

fn main() -> core::result::Result<(), eyre::Error> {

    if let Err(env::VarError::NotPresent) = env::var("RUST_BACKTRACE") {
        env::set_var("RUST_BACKTRACE", "1");
    }
    stable_eyre::install()?;

    TermLogger::init(
        LevelFilter::Info, Config::default(), TerminalMode::default(), ColorChoice::Auto
    )?;
    task::block_on(async_main())
}

struct Console {
    stdout: io::Stdout,
    stdin: io::Stdin
}

impl Console {
    fn new() -> Self {
        Self {
            stdout: io::stdout(),
            stdin: io::stdin()
        }
    }

    /// Prints a line to STDOUT
    async fn output(&mut self, line: &[u8]) -> Result<()> {
        self.stdout.write_all(line).await?;
        self.stdout.write_all(b"\n").await?;
        Ok(self.stdout.flush().await?)
    }

    /// Asks the user a question
    async fn input(&mut self, question: &[u8]) -> Result<String> {
        let mut answer = String::new();
        self.stdout.write_all(question).await?;
        self.stdout.flush().await?;
        self.stdin.read_line(&mut answer).await?;
        // Remove newline characters
        answer.retain(|c| !['\n', '\r', '\t'].contains(&c));
        Ok(answer)
    }
}

/// The reference date for presets. Overridable for reproducible sessions
fn today() -> NaiveDate {
    if let Some(today) = env::var("TODAY").ok().as_deref().and_then(parse::parse_user_date) {
        log::info!("Using {} as today from environment", today);
        return today;
    }
    Local::now().date_naive()
}

async fn async_main() -> Result<()> {

    let mut console = Console::new();
    let output_prefix = env::var_os("OUTPUT_PREFIX").unwrap_or_else(|| OsString::from("./output"));
    let today = today();

    let mut dashboard = Dashboard::default();
    let workbook = loop {
        let Some(workbook) = open_workbook(&mut console).await? else {
            console.output(b"\nProgram finished").await?;
            return Ok(());
        };
        if select_sheet(&mut console, &workbook, &mut dashboard).await? {
            break workbook;
        }
    };
    print_view(&mut console, &dashboard.view()).await?;

    loop {
        let choice = console.input(
            b"\nChoose what to do next
                     \n1. Quick range (today, this week, ...)
                     \n2. Type a date range
                     \n3. Reset the range
                     \n4. Sort the table
                     \n5. Show or hide a metric
                     \n6. Switch sheet
                     \n7. Export table and summary
                     \n0. Quit
                     \nYour choice:").await?;
        match choice.trim() {
            "1" => {
                let mut listing = String::new();
                for preset in Preset::values() {
                    listing.push_str(&format!("\n  {} ({})", preset.id(), preset));
                }
                console.output(listing.as_bytes()).await?;
                let preset_id = console.input(b"Preset:").await?;
                if !dashboard.apply_preset(&preset_id, today) {
                    console.output(format!("Unknown preset '{}'", preset_id).as_bytes()).await?;
                    continue;
                }
            }
            "2" => {
                let from = console.input(b"From (YYYY-MM-DD, blank for the start):").await?;
                let to = console.input(b"To (YYYY-MM-DD, blank for the end):").await?;
                dashboard.set_date_from(&from);
                dashboard.set_date_to(&to);
            }
            "3" => dashboard.reset_range(),
            "4" => {
                let key = console.input(b"Sort by (date, calls, emails, efilings, fourth):").await?;
                match key.parse::<SortKey>() {
                    Ok(key) => dashboard.toggle_sort(key),
                    Err(_) => {
                        console.output(format!("Unknown column '{}'", key).as_bytes()).await?;
                        continue;
                    }
                }
            }
            "5" => {
                let metric = console.input(b"Metric (calls, emails, efilings, fourth):").await?;
                match metric.parse::<Metric>() {
                    Ok(metric) => dashboard.toggle_metric(metric),
                    Err(_) => {
                        console.output(format!("Unknown metric '{}'", metric).as_bytes()).await?;
                        continue;
                    }
                }
            }
            "6" => {
                select_sheet(&mut console, &workbook, &mut dashboard).await?;
            }
            "7" => {
                let view = dashboard.view();
                let mut table_destination = output_prefix.clone();
                table_destination.push("-table.csv");
                export::write_table(&table_destination, &view.table).await?;
                let mut summary_destination = output_prefix.clone();
                summary_destination.push("-summary.json");
                export::write_summary(&summary_destination, &view).await?;
                console.output(b"Exported").await?;
                continue;
            }
            "0" => break,
            _ => {
                console.output(b"Invalid answer. Try again.").await?;
                continue;
            }
        }
        print_view(&mut console, &dashboard.view()).await?;
    }
    console.output(b"\nProgram finished").await?;
    Ok(())
}

/// Asks for a spreadsheet until one loads. A blank answer gives up
async fn open_workbook(console: &mut Console) -> Result<Option<Workbook>> {
    let mut from_env_var = env::var_os("DATA_FILE");
    loop {
        let path = if let Some(path) = from_env_var.take() {
            log::info!("Detected data file from environment: {}", path.to_string_lossy());
            PathBuf::from(path)
        } else {
            let path = console.input(b"Spreadsheet to open (blank to quit):").await?;
            if path.trim().is_empty() {
                return Ok(None);
            }
            PathBuf::from(path.trim())
        };
        match workbook::load_workbook(&path).await {
            Ok(workbook) => return Ok(Some(workbook)),
            Err(error) => {
                console.output(format!("Failed to load file: {}", error).as_bytes()).await?;
            }
        }
    }
}

/// Returns false when the workbook has no sheet to choose
async fn select_sheet(console: &mut Console, workbook: &Workbook, dashboard: &mut Dashboard) -> Result<bool> {
    let names = workbook.sheet_names().collect::<Vec<_>>();
    if names.is_empty() {
        console.output(format!("No sheets in {}", workbook.name()).as_bytes()).await?;
        return Ok(false);
    }
    let mut listing = format!("Sheets in {}:", workbook.name());
    for (index, name) in names.iter().enumerate() {
        listing.push_str(&format!("\n  {}. {}", index + 1, name));
    }
    console.output(listing.as_bytes()).await?;
    loop {
        let answer = console.input(b"Sheet number (default 1):").await?;
        let index = match answer.trim() {
            "" => 0,
            number => match number.parse::<usize>() {
                Ok(number) if number >= 1 && number <= names.len() => number - 1,
                _ => {
                    console.output(b"Invalid answer. Try again.").await?;
                    continue;
                }
            }
        };
        match workbook.rows_of(names[index]) {
            Ok(rows) => {
                dashboard.load_sheet(names[index], rows);
                return Ok(true);
            }
            Err(error) => {
                console.output(format!("Failed to load sheet: {}", error).as_bytes()).await?;
            }
        }
    }
}

fn describe_comparison(entry: Option<&ComparisonEntry>) -> String {
    match entry {
        None => String::new(),
        Some(ComparisonEntry { change: None, note, .. }) => {
            format!("  (up; {})", note.unwrap_or("no earlier figure"))
        },
        Some(ComparisonEntry { change: Some(change), sign, .. }) => {
            let arrow = match sign {
                Sign::Positive => "up",
                Sign::Negative => "down",
                Sign::Zero => "level"
            };
            format!("  ({} {:.1}%)", arrow, change.abs())
        }
    }
}

async fn print_view(console: &mut Console, view: &DashboardView) -> Result<()> {
    let mut report = String::new();
    report.push_str(&format!("\n-- {} --", view.sheet_name.as_deref().unwrap_or("No sheet")));
    if let Some(span) = &view.span {
        report.push_str(&format!(
            "\nData from {} to {}", parse::format_date(span.first), parse::format_date(span.last)
        ));
    }
    report.push_str(&format!("\nRange: {} ({} days)", view.bound, view.aggregate.row_count));
    if let Some(comparison_bound) = &view.comparison_bound {
        report.push_str(&format!("\nCompared with: {}", comparison_bound));
    }
    if view.is_empty() {
        report.push_str("\nNo rows in the selected range");
        return console.output(report.as_bytes()).await;
    }
    for metric in Metric::ALL {
        if !view.visible[metric] {
            continue;
        }
        let comparison = view.comparison.as_ref().and_then(|comparison| comparison[metric].as_ref());
        report.push_str(&format!(
            "\n{:>16}: {:>7}  avg {}/day{}",
            metric.label(),
            view.aggregate.totals[metric],
            view.aggregate.averages[metric],
            describe_comparison(comparison)
        ));
    }
    let shares = view.shares.iter()
        .filter(|share| view.visible[share.metric])
        .map(|share| format!("{} {}%", share.metric.key(), share.percent))
        .collect::<Vec<_>>();
    report.push_str(&format!("\nShares: {}", shares.join(", ")));
    if let Some(busiest) = &view.aggregate.busiest {
        report.push_str(&format!("\nBusiest day: {} with {}", busiest.date, busiest.total));
    }
    report.push_str("\n\nDate      ");
    for metric in Metric::ALL {
        if view.visible[metric] {
            report.push_str(&format!(" {:>10}", metric.key()));
        }
    }
    for row in view.table.iter().take(TABLE_PREVIEW_ROWS) {
        report.push_str(&format!("\n{}", row.date));
        for metric in Metric::ALL {
            if view.visible[metric] {
                report.push_str(&format!(" {:>10}", row.counts[metric]));
            }
        }
    }
    if view.table.len() > TABLE_PREVIEW_ROWS {
        report.push_str(&format!("\n... and {} more rows", view.table.len() - TABLE_PREVIEW_ROWS));
    }
    console.output(report.as_bytes()).await
}
