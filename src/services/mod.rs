//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own validation, orchestration, and notification so route
//! handlers can stay focused on HTTP translation and auth plumbing.

pub mod email_auth;
pub mod form;
pub mod notify;
pub mod requests;
pub mod session;
