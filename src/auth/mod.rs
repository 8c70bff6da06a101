//! Inbound authentication: init-data verification and the request gates.

/// Request middleware composing the identity and role gates.
pub mod guard;
/// Stateless verification of the signed Telegram init-data payload.
pub mod verifier;
