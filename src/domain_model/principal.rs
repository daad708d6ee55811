use super::Claims;
use serde::Serialize;
use tracing::debug;

pub const ROLE_PREFIX: &str = "ROLE_";

const ROLES_CLAIM: &str = "roles";
const AUTHORITIES_CLAIM: &str = "authorities";

/// Authenticated caller, attached to a request once its bearer token checks out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub authorities: Vec<String>,
    #[serde(skip)]
    pub claims: Claims,
}

impl Principal {
    /// Roles become `ROLE_<name>`, raw authorities are kept verbatim, so a role
    /// named `ADMIN` and an authority named `ADMIN` stay distinct. Only the
    /// `roles` claim grants roles: raw authorities carrying the `ROLE_` prefix
    /// are dropped.
    pub fn from_claims(subject: impl Into<String>, claims: Claims) -> Self {
        let mut authorities: Vec<String> = Vec::new();
        let roles = string_values(&claims, ROLES_CLAIM)
            .into_iter()
            .map(|role| format!("{ROLE_PREFIX}{role}"));
        let raw = string_values(&claims, AUTHORITIES_CLAIM)
            .into_iter()
            .filter(|authority| {
                let spoofed = authority.starts_with(ROLE_PREFIX);
                if spoofed {
                    debug!(authority, "ignoring role-prefixed raw authority");
                }
                !spoofed
            })
            .map(str::to_owned);

        for authority in roles.chain(raw) {
            if !authorities.contains(&authority) {
                authorities.push(authority);
            }
        }

        Principal {
            subject: subject.into(),
            authorities,
            claims,
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.authorities
            .iter()
            .any(|a| a.strip_prefix(ROLE_PREFIX) == Some(role))
    }
}

// A claim may hold a single string or a list; non-string entries are ignored.
fn string_values<'a>(claims: &'a Claims, name: &str) -> Vec<&'a str> {
    match claims.get(name) {
        Some(serde_json::Value::String(s)) => vec![s.as_str()],
        Some(serde_json::Value::Array(items)) => items.iter().filter_map(|v| v.as_str()).collect(),
        _ => Vec::new(),
    }
}
