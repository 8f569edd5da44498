//! Page controllers: view-bound fields plus the operations each view offers.
//!
//! Pages hold form state only. Data lives in the [`Session`] they are
//! handed, and every page renders itself as plain text for the CLI.

pub mod auth;
pub mod home;
pub mod nav;
pub mod post;

use crate::state::Session;

/// Login status for display purposes; an unreadable token shows as logged out.
fn logged_in_for_display(session: &Session) -> bool {
    session.auth.is_logged_in().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "unreadable session token; showing logged-out view");
        false
    })
}
