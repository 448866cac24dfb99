//! Presentation-facing operations. The dashboard card and the diet page both
//! go through the same scheduler and differ only in what they return.

pub mod dashboard;
pub mod diet_page;

pub use dashboard::{get_dashboard_summary, DashboardSummary};
pub use diet_page::{get_diet_page, list_phases, reset_diet, start_diet, DietPage, PhaseCard};
