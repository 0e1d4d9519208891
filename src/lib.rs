pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod highlight;
pub mod license;
pub mod ui;
pub mod view;

pub use catalog::{CatalogError, CatalogOrigin, LicenseCatalog};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use license::{ExpiryStatus, LicenseRecord, StatusKind};
pub use view::{process, FilterMode, RenderPass, SortDirection, SortKey, Summary, ViewState};
