use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use tracing::debug;
use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

/// Sign an HS256 bearer token for `user` that expires after `ttl_hours`.
pub fn issue_token(user: &User, jwt_secret: &str, ttl_hours: i64) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let exp = now + Duration::hours(ttl_hours);

    let header = json!({
        "alg": "HS256",
        "typ": "JWT"
    });
    let claims = json!({
        "sub": user.id,
        "email": user.email,
        "name": user.name,
        "role": user.role,
        "iat": now.timestamp(),
        "exp": exp.timestamp()
    });

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    );

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    debug!("Issued token for user: {}", user.id);
    Ok(format!("{}.{}", signing_input, signature))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        },
    };

    // Credentials are only honoured with an expiry.
    let exp = claims.exp.ok_or_else(|| "Token has no expiry".to_string())?;
    let now = Utc::now().timestamp() as u64;
    if exp < now {
        debug!("Token expired at {} (now: {})", exp, now);
        return Err("Token expired".to_string());
    }

    let created_at = claims.iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        name: claims.name,
        role: claims.role,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: "7b0c2f5e-4a35-4d7b-9a54-0f1f0c8f2b11".to_string(),
            email: Some("ana@example.com".to_string()),
            name: Some("Ana".to_string()),
            role: Some("user".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn test_issued_token_validates() {
        let token = issue_token(&sample_user(), "secret", 1).unwrap();
        let user = validate_token(&token, "secret").unwrap();

        assert_eq!(user.id, sample_user().id);
        assert_eq!(user.name.as_deref(), Some("Ana"));
        assert_eq!(user.role.as_deref(), Some("user"));
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(&sample_user(), "secret", 1).unwrap();
        assert_eq!(validate_token(&token, "other").unwrap_err(), "Invalid token signature");
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(&sample_user(), "secret", -1).unwrap();
        assert_eq!(validate_token(&token, "secret").unwrap_err(), "Token expired");
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let token = issue_token(&sample_user(), "secret", 1).unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let forged = json!({ "sub": "someone-else", "role": "admin", "exp": 9999999999u64 });
        parts[1] = URL_SAFE_NO_PAD.encode(forged.to_string());

        assert!(validate_token(&parts.join("."), "secret").is_err());
    }

    #[test]
    fn test_empty_secret_refused() {
        assert!(issue_token(&sample_user(), "", 1).is_err());
        assert!(validate_token("a.b.c", "").is_err());
    }
}
