use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::{error::Error as StdError, fmt};

use crate::gallery::identity::{Claim, ClaimSet};

// Errors returned by access-token verification + strict claim validation.
#[derive(Debug)]
pub enum AccessJwtError {
    Jwt(jsonwebtoken::errors::Error),
    MissingOrInvalidAud,
    EmptyClaim(&'static str),
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::MissingOrInvalidAud => write!(f, "missing or invalid 'aud' claim"),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Jwt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AccessJwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

fn aud_is_present_and_valid(aud: Option<&Value>) -> bool {
    match aud {
        // Typical: aud is a string
        Some(Value::String(s)) => !s.trim().is_empty(),
        // Also valid: aud is an array of strings
        Some(Value::Array(arr)) => arr.iter().any(|v| match v {
            Value::String(s) => !s.trim().is_empty(),
            _ => false,
        }),
        _ => false,
    }
}

/// Flattens verified JWT claims into the ordered claim set the gallery consumes.
///
/// - string => one claim
/// - array  => one claim per element (e.g. multiple `role` values)
/// - other scalars => their JSON text; nested objects are skipped
pub fn to_claim_set(claims: Map<String, Value>) -> ClaimSet {
    let mut set = Vec::with_capacity(claims.len());
    for (kind, value) in claims {
        match value {
            Value::Array(values) => {
                for v in values {
                    if let Some(text) = scalar_text(v) {
                        set.push(Claim::new(kind.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    set.push(Claim::new(kind, text));
                }
            }
        }
    }
    ClaimSet::new(set)
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Access-token verifier (EdDSA / RS256 public key, or HS256 shared secret).
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(
        decoding_key: DecodingKey,
        algorithm: Algorithm,
        issuer: &str,
        audience: &str,
        leeway_seconds: u64,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.leeway = leeway_seconds;

        Self {
            decoding_key,
            validation,
        }
    }

    pub fn from_public_key_pem(
        pem: &str,
        algorithm: Algorithm,
        issuer: &str,
        audience: &str,
        leeway_seconds: u64,
    ) -> Result<Self, String> {
        let decoding_key = match algorithm {
            Algorithm::EdDSA => DecodingKey::from_ed_pem(pem.as_bytes())
                .map_err(|e| format!("invalid ed25519 public key pem: {}", e))?,
            Algorithm::RS256 => DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| format!("invalid rsa public key pem: {}", e))?,
            other => return Err(format!("{:?} does not use a public key", other)),
        };

        Ok(Self::new(
            decoding_key,
            algorithm,
            issuer,
            audience,
            leeway_seconds,
        ))
    }

    pub fn from_secret(secret: &[u8], issuer: &str, audience: &str, leeway_seconds: u64) -> Self {
        Self::new(
            DecodingKey::from_secret(secret),
            Algorithm::HS256,
            issuer,
            audience,
            leeway_seconds,
        )
    }

    // Verify and decode a JWT access token.
    pub fn verify(&self, token: &str) -> Result<Map<String, Value>, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify + strict claim validation.
    ///
    /// `jsonwebtoken::Validation` already checks:
    /// - signature
    /// - `exp` (unless disabled)
    /// - `iss` and `aud` (because we set them)
    ///
    /// This method additionally checks that `iss` and `aud` are not empty.
    /// `sub` is deliberately left to the identity resolver: a token without one
    /// verifies, but resolves to no principal.
    pub fn verify_strict(&self, token: &str) -> Result<Map<String, Value>, AccessJwtError> {
        let claims = self.verify(token)?;

        let iss_ok = claims
            .get("iss")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !iss_ok {
            return Err(AccessJwtError::EmptyClaim("iss"));
        }
        if !aud_is_present_and_valid(claims.get("aud")) {
            return Err(AccessJwtError::MissingOrInvalidAud);
        }

        Ok(claims)
    }

    /// Verify + strict claim validation, then flatten into a `ClaimSet`.
    ///
    /// This is the recommended entry-point for middleware.
    pub fn verify_claims(&self, token: &str) -> Result<ClaimSet, AccessJwtError> {
        self.verify_strict(token).map(to_claim_set)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    pub(crate) const SECRET: &[u8] = b"test-secret-of-reasonable-length-0123456789";
    pub(crate) const ISSUER: &str = "https://localhost:44318";
    pub(crate) const AUDIENCE: &str = "imagegalleryapi";

    pub(crate) fn test_auth_service() -> AuthService {
        AuthService::from_secret(SECRET, ISSUER, AUDIENCE, 0)
    }

    pub(crate) fn sign(claims: Value) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    pub(crate) fn token_for(sub: &str) -> String {
        sign(json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "sub": sub,
            "exp": chrono::Utc::now().timestamp() + 600,
            "role": ["FreeUser"],
        }))
    }

    #[test]
    fn valid_token_yields_subject_claim() {
        let claims = test_auth_service().verify_claims(&token_for("alice")).unwrap();

        let sub = claims.find("sub").unwrap();
        assert_eq!(sub.value, "alice");
        assert_eq!(claims.find("role").unwrap().value, "FreeUser");
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let token = sign(json!({
            "iss": ISSUER,
            "aud": "someotherapi",
            "sub": "alice",
            "exp": chrono::Utc::now().timestamp() + 600,
        }));

        assert!(matches!(
            test_auth_service().verify_claims(&token),
            Err(AccessJwtError::Jwt(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = sign(json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "sub": "alice",
            "exp": chrono::Utc::now().timestamp() - 600,
        }));

        assert!(test_auth_service().verify_claims(&token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &json!({
                "iss": ISSUER,
                "aud": AUDIENCE,
                "sub": "alice",
                "exp": chrono::Utc::now().timestamp() + 600,
            }),
            &EncodingKey::from_secret(b"not-the-secret"),
        )
        .unwrap();

        assert!(test_auth_service().verify_claims(&token).is_err());
    }

    #[test]
    fn arrays_expand_and_objects_are_skipped() {
        let Value::Object(map) = json!({
            "role": ["a", "b"],
            "amr": "pwd",
            "auth_time": 1700000000,
            "cnf": { "jkt": "x" },
        }) else {
            unreachable!()
        };

        let set = to_claim_set(map);
        let roles: Vec<&str> = set
            .iter()
            .filter(|c| c.kind == "role")
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(roles, ["a", "b"]);
        assert_eq!(set.find("auth_time").unwrap().value, "1700000000");
        assert!(set.find("cnf").is_none());
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn claims_keep_token_order() {
        let token = sign(json!({
            "sub": "alice",
            "iss": ISSUER,
            "aud": AUDIENCE,
            "exp": chrono::Utc::now().timestamp() + 600,
            "role": "FreeUser",
            "amr": "pwd",
        }));

        let set = test_auth_service().verify_claims(&token).unwrap();
        let kinds: Vec<&str> = set.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(kinds, ["sub", "iss", "aud", "exp", "role", "amr"]);
    }
}
