/// Authenticated session states
///
/// Owned exclusively by the authenticator. The coordinator only sees the
/// effects through fetch outcomes.
use std::fmt;

/// What the session currently authenticates with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialMaterial {
    /// HTTP Basic credentials sent with every request
    Basic { username: String },

    /// A fixed `Authorization: Bearer` header
    BearerHeader,

    /// Session cookies, by name (values are never kept here)
    Cookies(Vec<String>),
}

/// Lifecycle of an authenticated session
///
/// `Unauthenticated → Authenticated → Expired → Authenticated → …`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No credentials applied yet, or the initial login failed
    #[default]
    Unauthenticated,

    /// Credentials are in place
    Authenticated(CredentialMaterial),

    /// The server rejected the session; a re-login is needed
    Expired,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated(_) => "authenticated",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated(CredentialMaterial::Basic { username }) => {
                write!(f, "authenticated (basic as {})", username)
            }
            Self::Authenticated(CredentialMaterial::BearerHeader) => {
                write!(f, "authenticated (bearer header)")
            }
            Self::Authenticated(CredentialMaterial::Cookies(names)) => {
                write!(f, "authenticated (cookies: {})", names.join(", "))
            }
            other => f.write_str(other.as_str()),
        }
    }
}
