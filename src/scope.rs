//! OAuth2 scopes understood by the Live authorization endpoint.

use std::fmt;
use std::str::FromStr;

/// A capability requested during authorization.
///
/// The declaration order is the canonical order used when scopes are
/// rendered into an authorization URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    Basic,
    ContactsSkyDrive,
    Emails,
    OfflineAccess,
    Photos,
    SignIn,
    SkyDrive,
    SkyDriveUpdate,
}

impl Scope {
    pub const ALL: [Scope; 8] = [
        Scope::Basic,
        Scope::ContactsSkyDrive,
        Scope::Emails,
        Scope::OfflineAccess,
        Scope::Photos,
        Scope::SignIn,
        Scope::SkyDrive,
        Scope::SkyDriveUpdate,
    ];

    /// Wire name of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Basic => "wl.basic",
            Scope::ContactsSkyDrive => "wl.contacts_skydrive",
            Scope::Emails => "wl.emails",
            Scope::OfflineAccess => "wl.offline_access",
            Scope::Photos => "wl.photos",
            Scope::SignIn => "wl.signin",
            Scope::SkyDrive => "wl.skydrive",
            Scope::SkyDriveUpdate => "wl.skydrive_update",
        }
    }

    /// Render scopes space-joined in canonical order, dropping duplicates.
    pub fn join(scopes: &[Scope]) -> String {
        let mut sorted = scopes.to_vec();
        sorted.sort();
        sorted.dedup();
        sorted
            .iter()
            .map(Scope::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    /// Accepts the wire name with or without the `wl.` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let wanted = wanted.strip_prefix("wl.").unwrap_or(wanted);
        Scope::ALL
            .iter()
            .copied()
            .find(|scope| &scope.as_str()[3..] == wanted)
            .ok_or_else(|| format!("unknown scope: {}", s))
    }
}
