use userguard_auth::User;

/// The stored user behind the validated bearer token of a request.
///
/// Inserted by the auth middleware next to the user's
/// [`userguard_auth::Identity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub User);

/// The raw bearer token the request was authenticated with.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("BearerToken(..)")
    }
}
