#[macro_use]
mod macros;

pub mod api;
pub mod audit;
pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod resources;
pub mod types;

pub use api::{Changes, HttpClient, PageRequest, ResourceClient, parse_api_error};
pub use audit::{AuditSummary, render_audit};
pub use config::Config;
pub use controller::{ListScreen, QueryState, ScreenDriver, ScreenEvent, ScreenView};
pub use error::{LabdeskError, Result};
pub use resources::{Resource, ResourceKind};
pub use types::{Cursor, Page, Record, RecordId};
