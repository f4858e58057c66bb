/// Router Module Index
///
/// Routing is split by access requirement so that the session check is applied to a
/// whole module at once and a protected endpoint cannot be exposed by accident.

/// Routes accessible to anonymous visitors.
pub mod public;

/// Routes protected by the `AuthUser` middleware. Requires a valid session.
pub mod authenticated;
