use std::borrow::Cow;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use time::Date;

use crate::license::{ExpiryStatus, LicenseRecord, StatusKind, EXPIRING_WINDOW_DAYS};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FilterMode {
    #[default]
    All,
    ExpiringSoon,
    Expired,
}

impl FilterMode {
    pub fn label(&self) -> &'static str {
        match self {
            FilterMode::All => "All Licenses",
            FilterMode::ExpiringSoon => "Expiring Soon",
            FilterMode::Expired => "Expired",
        }
    }

    pub fn admits(&self, record: &LicenseRecord, today: Date) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::ExpiringSoon => record
                .days_until_expiry(today)
                .is_some_and(|days| (0..=EXPIRING_WINDOW_DAYS).contains(&days)),
            FilterMode::Expired => record
                .days_until_expiry(today)
                .is_some_and(|days| days < 0),
        }
    }

    pub fn next(self) -> Self {
        cycle(self)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortKey {
    ProductName,
    Vendor,
    #[default]
    ExpiryDate,
    Department,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::ProductName => "Product Name",
            SortKey::Vendor => "Vendor",
            SortKey::ExpiryDate => "Expiry Date",
            SortKey::Department => "Department",
        }
    }

    pub fn next(self) -> Self {
        cycle(self)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search: String,
    pub filter: FilterMode,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub show_keys: bool,
}

/// Search, then filter, then a stable sort.
pub fn process<'a>(
    records: &'a [LicenseRecord],
    view: &ViewState,
    today: Date,
) -> Vec<&'a LicenseRecord> {
    let needle = view.search.to_lowercase();
    let mut selected: Vec<&LicenseRecord> = records
        .iter()
        .filter(|record| needle.is_empty() || record.matches_search(&needle))
        .filter(|record| view.filter.admits(record, today))
        .collect();
    selected.sort_by(|a, b| compare(a, b, view.sort_key, view.direction));
    selected
}

pub fn compare(
    a: &LicenseRecord,
    b: &LicenseRecord,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    let ordering = match key {
        SortKey::ProductName => compare_text(&a.product_name, &b.product_name),
        SortKey::Vendor => compare_text(&a.vendor, &b.vendor),
        SortKey::Department => compare_text(
            a.department.as_deref().unwrap_or(""),
            b.department.as_deref().unwrap_or(""),
        ),
        SortKey::ExpiryDate => compare_expiry(a.expiry(), b.expiry()),
    };
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

// unparseable dates sort after every real date
fn compare_expiry(a: Option<Date>, b: Option<Date>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone)]
pub struct LicenseRow<'a> {
    pub record: &'a LicenseRecord,
    pub status: ExpiryStatus,
    pub key: Cow<'a, str>,
}

#[derive(Debug, Clone)]
pub struct RenderPass<'a> {
    pub today: Date,
    pub rows: Vec<LicenseRow<'a>>,
    pub summary: Summary,
}

impl<'a> RenderPass<'a> {
    pub fn compute(records: &'a [LicenseRecord], view: &ViewState, today: Date) -> Self {
        let rows = process(records, view, today)
            .into_iter()
            .map(|record| LicenseRow {
                record,
                status: record.status(today),
                key: record.display_key(view.show_keys),
            })
            .collect();
        Self {
            today,
            rows,
            summary: Summary::collect(records, today),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub expired: usize,
    pub expiring: usize,
    pub warning: usize,
    pub active: usize,
    pub unknown: usize,
}

impl Summary {
    pub fn collect(records: &[LicenseRecord], today: Date) -> Self {
        let mut summary = Summary {
            total: records.len(),
            ..Summary::default()
        };
        for record in records {
            match record.status(today).kind() {
                StatusKind::Expired => summary.expired += 1,
                StatusKind::Expiring => summary.expiring += 1,
                StatusKind::Warning => summary.warning += 1,
                StatusKind::Active => summary.active += 1,
                StatusKind::Unknown => summary.unknown += 1,
            }
        }
        summary
    }
}

/// Records expiring within `[today, today + days]`, soonest first.
pub fn expiring_within(
    records: &[LicenseRecord],
    today: Date,
    days: i64,
) -> Vec<(&LicenseRecord, i64)> {
    let mut expiring: Vec<(&LicenseRecord, i64)> = records
        .iter()
        .filter_map(|record| {
            record
                .days_until_expiry(today)
                .filter(|remaining| (0..=days).contains(remaining))
                .map(|remaining| (record, remaining))
        })
        .collect();
    expiring.sort_by_key(|(_, remaining)| *remaining);
    expiring
}

fn cycle<T>(current: T) -> T
where
    T: IntoEnumIterator + PartialEq + Copy,
{
    let all: Vec<T> = T::iter().collect();
    let idx = all.iter().position(|value| *value == current).unwrap_or(0);
    all[(idx + 1) % all.len()]
}
