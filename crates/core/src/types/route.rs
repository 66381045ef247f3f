//! Navigation targets the host UI understands.

use core::fmt;

use super::code::CapsuleCode;

/// A screen in the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Create,
    Capsule(CapsuleCode),
    /// Admin console; doubles as the login entry point.
    Admin,
    About,
}

impl Route {
    /// Where an authorization failure sends the user.
    pub const LOGIN: Self = Self::Admin;

    /// The URL path for this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_owned(),
            Self::Create => "/create".to_owned(),
            Self::Capsule(code) => format!("/capsule/{code}"),
            Self::Admin => "/admin".to_owned(),
            Self::About => "/about".to_owned(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
