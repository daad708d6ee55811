use serde::Deserialize;

/// How refresh tokens are checked when they are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTokenMode {
    /// Signature and expiry only; no server-side revocation.
    #[default]
    SimpleValidation,
    /// Every issued refresh token is persisted and re-checked on use.
    StoreAndValidate,
}

/// What happens to a refresh token once rotation has consumed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReuseHandling {
    /// Delete the record; a replay looks like an unknown token.
    #[default]
    Remove,
    /// Keep the record flagged so a replay can be told apart from garbage.
    Blacklist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    InMemory,
    Relational,
    Cache,
}
