/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules, so a protected endpoint cannot be exposed by accident.

/// Routes accessible to all clients (anonymous, read-only, plus
/// registration). Data handlers here only ever expose published records.
pub mod public;

/// Routes protected by the `AuthDev` extractor.
/// Requires a valid, non-revoked API key within its rate-limit quota.
pub mod authenticated;

/// Routes restricted exclusively to developers with the 'admin' role.
/// The role check happens inside each handler.
pub mod admin;
