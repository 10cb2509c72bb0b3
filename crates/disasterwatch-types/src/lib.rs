//! Shared type definitions for the DisasterWatch dashboard.
//!
//! This crate is the single source of truth for the shapes exchanged with
//! the backend and passed between the core, the client and the terminal
//! front end. Canonical types are exported to `TypeScript` via `ts-rs` for
//! the browser build.
//!
//! # Modules
//!
//! - [`ids`] -- Wrappers for backend-assigned event and user keys
//! - [`enums`] -- Severity buckets, the severity filter, account roles
//! - [`structs`] -- Canonical events, raw wire records, account payloads
//! - [`error`] -- Parse errors for the textual forms of the enums

pub mod enums;
pub mod error;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Role, Severity, SeverityFilter};
pub use error::TypesError;
pub use ids::{EventId, UserId};
pub use structs::{ApiMessage, AuthResponse, Event, GeoPoint, RawEvent, UserProfile, UserRecord};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings to `bindings/` relative to the crate
        // root when the exported types are touched here.
        use ts_rs::TS;

        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::UserId::export_all();
        let _ = crate::enums::Severity::export_all();
        let _ = crate::enums::Role::export_all();
        let _ = crate::structs::GeoPoint::export_all();
        let _ = crate::structs::Event::export_all();
        let _ = crate::structs::UserProfile::export_all();
    }
}
