use std::borrow::Cow;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use time::Date;
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::catalog::LicenseCatalog;
use crate::config::AppConfig;
use crate::license::{ExpiryStatus, LicenseRecord, StatusKind};
use crate::view::{
    expiring_within, FilterMode, RenderPass, SortDirection, SortKey, Summary, ViewState,
};

const EMPTY_CELL: &str = "-";

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Case-insensitive text matched against product, vendor, department and category
    #[arg(long)]
    pub search: Option<String>,
    /// Expiry filter: all, expiring-soon, expired
    #[arg(long)]
    pub filter: Option<FilterMode>,
    /// Sort key: product-name, vendor, expiry-date, department
    #[arg(long)]
    pub sort: Option<SortKey>,
    /// Sort descending
    #[arg(long, conflicts_with = "asc")]
    pub desc: bool,
    /// Sort ascending
    #[arg(long)]
    pub asc: bool,
    /// Print license keys unredacted
    #[arg(long, conflicts_with = "hide_keys")]
    pub show_keys: bool,
    /// Redact license keys even when the config shows them
    #[arg(long)]
    pub hide_keys: bool,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// License identifier
    pub id: String,
    /// Print the license key unredacted
    #[arg(long, conflicts_with = "hide_keys")]
    pub show_keys: bool,
    /// Redact the license key even when the config shows it
    #[arg(long)]
    pub hide_keys: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AlertArgs {
    /// Report licenses expiring within this many days (defaults to the config value)
    #[arg(long)]
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListedLicense<'a> {
    id: &'a str,
    product_name: &'a str,
    vendor: &'a str,
    license_key: Cow<'a, str>,
    expiry_date: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    department: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    status: StatusKind,
    days_until_expiry: Option<i64>,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn list_licenses(
    config: &AppConfig,
    catalog: &LicenseCatalog,
    today: Date,
    args: ListArgs,
) -> Result<()> {
    let view = view_for(config, &args);
    let pass = RenderPass::compute(catalog.records(), &view, today);
    let output = if args.json {
        let mut json = format_json(&pass).context("serializing license list")?;
        json.push('\n');
        json
    } else {
        format_table(&pass)
    };
    print!("{output}");
    Ok(())
}

pub fn show_license(
    config: &AppConfig,
    catalog: &LicenseCatalog,
    today: Date,
    args: ShowArgs,
) -> Result<()> {
    let record = catalog.get(args.id.trim()).with_context(|| {
        format!(
            "license '{}' not found in {}",
            args.id,
            catalog.origin().describe()
        )
    })?;
    let show_keys = key_visibility(config.view.show_keys, args.show_keys, args.hide_keys);
    print!("{}", format_details(record, today, show_keys));
    Ok(())
}

pub fn print_summary(catalog: &LicenseCatalog, today: Date) -> Result<()> {
    let summary = Summary::collect(catalog.records(), today);
    print!("{}", format_summary(&summary));
    Ok(())
}

pub fn alert_report(
    config: &AppConfig,
    catalog: &LicenseCatalog,
    today: Date,
    args: AlertArgs,
) -> Result<()> {
    let days = args.days.unwrap_or(config.alerts.days);
    let report = build_alert_report(catalog.records(), today, days);
    tracing::debug!(days, "built expiry alert report");
    print!("{report}");
    Ok(())
}

fn view_for(config: &AppConfig, args: &ListArgs) -> ViewState {
    let mut view = config.view.to_view_state();
    if let Some(search) = &args.search {
        view.search = search.clone();
    }
    if let Some(filter) = args.filter {
        view.filter = filter;
    }
    if let Some(sort) = args.sort {
        view.sort_key = sort;
    }
    if args.desc {
        view.direction = SortDirection::Descending;
    } else if args.asc {
        view.direction = SortDirection::Ascending;
    }
    view.show_keys = key_visibility(view.show_keys, args.show_keys, args.hide_keys);
    view
}

fn key_visibility(configured: bool, show: bool, hide: bool) -> bool {
    match (show, hide) {
        (true, _) => true,
        (_, true) => false,
        _ => configured,
    }
}

fn format_table(pass: &RenderPass<'_>) -> String {
    let mut out = String::new();
    if pass.is_empty() {
        out.push_str("No licenses found matching your criteria.\n");
    } else {
        let header = ["PRODUCT", "VENDOR", "LICENSE KEY", "EXPIRES", "STATUS", "DEPARTMENT"]
            .map(String::from)
            .to_vec();
        let mut table = vec![header];
        for row in &pass.rows {
            table.push(vec![
                row.record.product_name.clone(),
                row.record.vendor.clone(),
                row.key.to_string(),
                row.record.expiry_date.clone(),
                row.status.label(),
                row.record
                    .department
                    .clone()
                    .unwrap_or_else(|| EMPTY_CELL.to_string()),
            ]);
        }
        let columns = table[0].len();
        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                table
                    .iter()
                    .map(|cells| UnicodeWidthStr::width(cells[col].as_str()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        for cells in &table {
            let mut line = String::new();
            for (col, cell) in cells.iter().enumerate() {
                line.push_str(cell);
                if col + 1 < columns {
                    let pad = widths[col] - UnicodeWidthStr::width(cell.as_str()) + 2;
                    line.extend(std::iter::repeat(' ').take(pad));
                }
            }
            let _ = writeln!(&mut out, "{}", line.trim_end());
        }
    }
    let _ = writeln!(
        &mut out,
        "\nShowing {} of {} licenses (as of {})",
        pass.len(),
        pass.summary.total,
        pass.today
    );
    out
}

fn format_json(pass: &RenderPass<'_>) -> serde_json::Result<String> {
    let listed: Vec<ListedLicense<'_>> = pass
        .rows
        .iter()
        .map(|row| ListedLicense {
            id: &row.record.id,
            product_name: &row.record.product_name,
            vendor: &row.record.vendor,
            license_key: row.key.clone(),
            expiry_date: &row.record.expiry_date,
            notes: row.record.notes.as_deref(),
            department: row.record.department.as_deref(),
            category: row.record.category.as_deref(),
            status: row.status.kind(),
            days_until_expiry: row.status.days_until_expiry(),
        })
        .collect();
    serde_json::to_string_pretty(&listed)
}

fn format_details(record: &LicenseRecord, today: Date, show_keys: bool) -> String {
    let status = record.status(today);
    let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| EMPTY_CELL.to_string());
    let mut out = String::new();
    let _ = writeln!(&mut out, "{}", record.product_name);
    let _ = writeln!(&mut out, "  ID:           {}", record.id);
    let _ = writeln!(&mut out, "  Vendor:       {}", record.vendor);
    let _ = writeln!(&mut out, "  Department:   {}", optional(&record.department));
    let _ = writeln!(&mut out, "  Category:     {}", optional(&record.category));
    let _ = writeln!(&mut out, "  Expiry Date:  {}", record.expiry_date);
    let _ = writeln!(&mut out, "  Status:       {}", describe_status(&status));
    let _ = writeln!(
        &mut out,
        "  License Key:  {}",
        record.display_key(show_keys)
    );
    if let Some(notes) = &record.notes {
        let _ = writeln!(&mut out, "  Notes:        {notes}");
    }
    out
}

pub fn describe_status(status: &ExpiryStatus) -> String {
    match status {
        ExpiryStatus::Expired { days_overdue: 1 } => "expired 1 day ago".to_string(),
        ExpiryStatus::Expired { days_overdue } => format!("expired {days_overdue} days ago"),
        ExpiryStatus::Unknown => "unknown (unparseable expiry date)".to_string(),
        other => format!("{}, {} left", other.kind(), other.label()),
    }
}

fn format_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "Total licenses:  {}", summary.total);
    let _ = writeln!(&mut out, "Expired:         {}", summary.expired);
    let _ = writeln!(&mut out, "Expiring soon:   {}", summary.expiring);
    let _ = writeln!(&mut out, "Warning:         {}", summary.warning);
    let _ = writeln!(&mut out, "Active:          {}", summary.active);
    if summary.unknown > 0 {
        let _ = writeln!(&mut out, "Unknown:         {}", summary.unknown);
    }
    out
}

fn build_alert_report(records: &[LicenseRecord], today: Date, days: u32) -> String {
    let expiring = expiring_within(records, today, i64::from(days));
    if expiring.is_empty() {
        return "No licenses expiring soon.\n".to_string();
    }
    let count = expiring.len();
    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        "# License Expiration Alert - {count} license(s) expiring soon\n"
    );
    let _ = writeln!(
        &mut out,
        "The following {count} license(s) are expiring within the next {days} days:\n"
    );
    for (record, remaining) in expiring {
        let _ = writeln!(&mut out, "### {}", record.product_name);
        let _ = writeln!(&mut out, "- **Vendor:** {}", record.vendor);
        let _ = writeln!(
            &mut out,
            "- **Department:** {}",
            record.department.as_deref().unwrap_or("N/A")
        );
        let _ = writeln!(&mut out, "- **Expiry Date:** {}", record.expiry_date);
        let _ = writeln!(&mut out, "- **Days Until Expiry:** {remaining}");
        let _ = writeln!(
            &mut out,
            "- **Notes:** {}\n",
            record.notes.as_deref().unwrap_or("N/A")
        );
    }
    out.push_str("## Action Required\n");
    out.push_str("Please review these licenses and take appropriate action:\n");
    out.push_str("1. Contact the vendor for renewal\n");
    out.push_str("2. Update the license information in the inventory\n");
    out.push_str("3. Notify the relevant departments\n");
    out
}
