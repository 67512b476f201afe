//! Route gate and authentication extractors.
//!
//! - [`gate::route_gate`] -- Protects admin pages and the admin API.
//! - [`auth`] -- Extracts the signed-in [`SessionUser`](crate::auth::verify::SessionUser).
//! - [`rbac::RequireStaff`] -- Requires staff or superuser.
//! - [`rbac::RequireSuperuser`] -- Requires superuser.
//! - [`rbac::RequireUser`] -- Requires any authenticated user.

pub mod auth;
pub mod gate;
pub mod rbac;
