use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::model::role::Role;
use crate::models::{Claims, TokenType};

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn issue(
    user_id: u64,
    email: &str,
    role: Role,
    token_type: TokenType,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = Claims {
        user_id,
        sub: email.to_string(),
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn generate_access_token(
    user_id: u64,
    email: &str,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    issue(user_id, email, role, TokenType::Access, secret, ttl).map(|(token, _)| token)
}

pub fn generate_refresh_token(
    user_id: u64,
    email: &str,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    issue(user_id, email, role, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp as i64, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-test-secret";

    #[test]
    fn access_token_round_trips_claims() {
        let token = generate_access_token(7, "jane@x.io", Role::Admin, SECRET, 60).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "jane@x.io");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_tokens_get_unique_ids() {
        let (_, a) = generate_refresh_token(1, "a@x.io", Role::Employee, SECRET, 60).unwrap();
        let (_, b) = generate_refresh_token(1, "a@x.io", Role::Employee, SECRET, 60).unwrap();
        assert_eq!(a.token_type, TokenType::Refresh);
        assert_ne!(a.jti, b.jti);
        assert!(a.expires_at() > Utc::now());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(1, "a@x.io", Role::Employee, SECRET, 60).unwrap();
        assert!(verify_token(&token, "another-secret-entirely").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            user_id: 1,
            sub: "a@x.io".to_string(),
            role: Role::Employee,
            // well past the default 60s leeway
            exp: now() - 3600,
            jti: Uuid::new_v4().to_string(),
            token_type: TokenType::Access,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }
}
