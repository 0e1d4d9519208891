use serde::Serialize;
use strum::{Display, EnumIter};
use time::Date;

pub const EXPIRING_WINDOW_DAYS: i64 = 30;
pub const WARNING_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    Expired { days_overdue: i64 },
    Expiring { days_left: i64 },
    Warning { days_left: i64 },
    Active { days_left: i64 },
    Unknown,
}

// ordered from most to least urgent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StatusKind {
    Expired,
    Expiring,
    Warning,
    Active,
    Unknown,
}

impl ExpiryStatus {
    pub fn derive(days_until_expiry: Option<i64>) -> Self {
        match days_until_expiry {
            None => ExpiryStatus::Unknown,
            Some(days) if days < 0 => ExpiryStatus::Expired {
                days_overdue: -days,
            },
            Some(days) if days <= EXPIRING_WINDOW_DAYS => ExpiryStatus::Expiring { days_left: days },
            Some(days) if days <= WARNING_WINDOW_DAYS => ExpiryStatus::Warning { days_left: days },
            Some(days) => ExpiryStatus::Active { days_left: days },
        }
    }

    pub fn from_dates(expiry: Option<Date>, today: Date) -> Self {
        Self::derive(expiry.map(|expiry| (expiry - today).whole_days()))
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            ExpiryStatus::Expired { .. } => StatusKind::Expired,
            ExpiryStatus::Expiring { .. } => StatusKind::Expiring,
            ExpiryStatus::Warning { .. } => StatusKind::Warning,
            ExpiryStatus::Active { .. } => StatusKind::Active,
            ExpiryStatus::Unknown => StatusKind::Unknown,
        }
    }

    pub fn days_until_expiry(&self) -> Option<i64> {
        match *self {
            ExpiryStatus::Expired { days_overdue } => Some(-days_overdue),
            ExpiryStatus::Expiring { days_left }
            | ExpiryStatus::Warning { days_left }
            | ExpiryStatus::Active { days_left } => Some(days_left),
            ExpiryStatus::Unknown => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ExpiryStatus::Expired { .. } => "Expired".to_string(),
            ExpiryStatus::Expiring { days_left }
            | ExpiryStatus::Warning { days_left }
            | ExpiryStatus::Active { days_left } => format_days(*days_left),
            ExpiryStatus::Unknown => "Unknown".to_string(),
        }
    }
}

fn format_days(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}
