/*
 * Responsibility
 * - 認証済みリクエストの claim set から acting principal (subject id) を取り出す
 * - 状態を持たない純粋関数。ambient な "current user" は持たず、principal は引数で渡す
 */

/// Claim type carrying the subject identifier.
pub const SUBJECT_CLAIM: &str = "sub";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub kind: String,
    pub value: String,
}

impl Claim {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Ordered claims attached to an authenticated request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet(Vec<Claim>);

impl ClaimSet {
    pub fn new(claims: Vec<Claim>) -> Self {
        Self(claims)
    }

    // First claim of the given type.
    pub fn find(&self, kind: &str) -> Option<&Claim> {
        self.iter().find(|c| c.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The acting caller of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject: String,
}

impl Principal {
    pub fn subject(&self) -> &str {
        &self.subject
    }

    // Owns `owner_id` iff the subject matches exactly.
    pub fn owns(&self, owner_id: &str) -> bool {
        self.subject == owner_id
    }
}

/// Resolves the principal from a claim set.
///
/// `None` means "unauthenticated": either no subject claim, or a blank one.
pub fn resolve(claims: &ClaimSet) -> Option<Principal> {
    claims
        .find(SUBJECT_CLAIM)
        .filter(|c| !c.value.trim().is_empty())
        .map(|c| Principal {
            subject: c.value.clone(),
        })
}

#[cfg(test)]
pub(crate) fn principal(subject: &str) -> Principal {
    Principal {
        subject: subject.to_string(),
    }
}
