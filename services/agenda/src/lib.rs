//! Scheduling and cash-flow core for AgendaPro
//!
//! A single business owner manages clients, a service catalog, appointments
//! and a cash ledger. Appointments snapshot the client/service they were
//! booked with; completing one posts a credit to the ledger; the ledger is
//! summarized over the current day, week and month.
//!
//! All state lives behind [`store::EntityStore`]. Every operation takes the
//! owner explicitly and reports its outcome through a [`notify::Notifier`].

pub mod aggregation;
pub mod catalog;
pub mod collections;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod resolver;
pub mod routes;
pub mod state;
pub mod store;

pub use catalog::Catalog;
pub use context::AgendaContext;
pub use error::{AgendaError, AgendaResult, StoreError};
pub use lifecycle::AppointmentController;
