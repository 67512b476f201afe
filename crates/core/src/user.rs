//! User identities.
//!
//! Two deliberately unrelated types:
//!
//! - [`AuthorizedUser`] -- the identity returned by the backend `me`
//!   endpoint. The only type role checks accept.
//! - [`DisplayUser`] -- a presentation projection built from any user-shaped
//!   JSON (including client-supplied data). Carries hints such as
//!   "is an employee" for menus; it has no path into authorization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::UserId;

/// Identity resolved by the backend identity endpoint.
///
/// Deserializes from the backend's user object. The id is read from `id`,
/// falling back to `id_cuenta`; `is_staff` and `is_superuser` default to
/// `false` when absent or not booleans. The full object is kept so it can be
/// returned to the client unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct AuthorizedUser {
    id: UserId,
    is_staff: bool,
    is_superuser: bool,
    profile: Map<String, Value>,
}

impl AuthorizedUser {
    /// Build a user with no profile fields beyond id and role flags.
    pub fn new(id: UserId, is_staff: bool, is_superuser: bool) -> Self {
        let mut profile = Map::new();
        profile.insert("id".into(), Value::from(id));
        profile.insert("is_staff".into(), Value::Bool(is_staff));
        profile.insert("is_superuser".into(), Value::Bool(is_superuser));
        Self {
            id,
            is_staff,
            is_superuser,
            profile,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn is_staff(&self) -> bool {
        self.is_staff
    }

    pub fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    /// The backend's user object as received.
    pub fn profile(&self) -> &Map<String, Value> {
        &self.profile
    }
}

impl TryFrom<Map<String, Value>> for AuthorizedUser {
    type Error = String;

    fn try_from(profile: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = ["id", "id_cuenta"]
            .iter()
            .find_map(|key| profile.get(*key).and_then(Value::as_i64))
            .ok_or_else(|| "user object has no integer `id` or `id_cuenta`".to_string())?;

        let flag = |key: &str| profile.get(key).and_then(Value::as_bool).unwrap_or(false);
        let is_staff = flag("is_staff");
        let is_superuser = flag("is_superuser");

        Ok(Self {
            id,
            is_staff,
            is_superuser,
            profile,
        })
    }
}

impl From<AuthorizedUser> for Map<String, Value> {
    fn from(user: AuthorizedUser) -> Self {
        user.profile
    }
}

/// Email patterns that mark an account as an employee for display purposes.
///
/// Each entry is one of:
/// - `@domain.tld` -- matches any address ending with the suffix,
/// - `name@domain.tld` -- matches that exact address,
/// - anything else -- matches addresses containing the fragment.
#[derive(Debug, Clone, Default)]
pub struct EmployeeEmailPatterns(Vec<String>);

impl EmployeeEmailPatterns {
    /// Parse a comma-separated pattern list. Entries are trimmed and
    /// lowercased; empty entries are dropped.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn matches(&self, email: &str) -> bool {
        if email.is_empty() {
            return false;
        }
        self.0.iter().any(|pattern| {
            if pattern.starts_with('@') {
                email.ends_with(pattern.as_str())
            } else if pattern.contains('@') {
                email == pattern
            } else {
                email.contains(pattern.as_str())
            }
        })
    }
}

/// Presentation-only view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayUser {
    /// `email`, falling back to `correo`, or empty.
    pub email: String,
    /// Whether menus should offer back-office entry points.
    pub is_employee: bool,
}

impl DisplayUser {
    /// Build the display view from a user-shaped JSON object.
    ///
    /// The employee hint is true for staff/superuser flags, a role name
    /// containing "empleado", an explicit `is_empleado` flag, or an email
    /// matching `patterns`.
    pub fn from_profile(profile: &Value, patterns: &EmployeeEmailPatterns) -> Self {
        let email = ["email", "correo"]
            .iter()
            .find_map(|key| {
                profile
                    .get(*key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_default()
            .to_string();

        let is_employee = flag(profile, "is_superuser")
            || flag(profile, "is_staff")
            || role_names(profile).any(|name| name.to_lowercase().contains("empleado"))
            || flag(profile, "is_empleado")
            || patterns.matches(&email.to_lowercase());

        Self { email, is_employee }
    }
}

fn flag(profile: &Value, key: &str) -> bool {
    profile.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Every role label the backend may have attached to a user object.
fn role_names(profile: &Value) -> impl Iterator<Item = &str> {
    let rol = profile.get("rol");
    let nested = rol
        .and_then(Value::as_object)
        .and_then(|r| r.get("nombre_rol").or_else(|| r.get("nombre")))
        .and_then(Value::as_str);
    let flat = ["rol", "role", "role_name"]
        .into_iter()
        .filter_map(move |key| profile.get(key).and_then(Value::as_str));
    nested.into_iter().chain(flat)
}
