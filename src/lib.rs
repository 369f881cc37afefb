//! Query and aggregation engine behind the verification-void dashboard.
//!
//! A [`Table`](data::model::Table) is loaded once and shared read-only.
//! Every filter change produces a [`DashboardQuery`](dashboard::DashboardQuery)
//! snapshot; [`Dashboard::build`](dashboard::Dashboard::build) turns it into a
//! fresh, immutable [`DashboardView`](dashboard::DashboardView).

pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
