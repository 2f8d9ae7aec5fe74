//! Unit tests for session token signing.

#[cfg(test)]
mod tests {
    use super::super::{
        Claims,
        jwt::{JwtConfig, JwtError, JwtService},
    };
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            token_expires_days: 7,
        })
    }

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let user_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::days(7);

        let claims = Claims::new(user_id, expires_at);

        assert_eq!(claims.sub, user_id);
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_each_token_gets_unique_jti() {
        let svc = service("secret");
        let user_id = Uuid::new_v4();

        let a = svc.generate_session_token(user_id).unwrap();
        let b = svc.generate_session_token(user_id).unwrap();

        assert_ne!(a.claims.jti, b.claims.jti);
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_token_expires_after_seven_days() {
        let svc = service("secret");
        let signed = svc.generate_session_token(Uuid::new_v4()).unwrap();

        let lifetime = signed.claims.exp - signed.claims.iat;
        assert_eq!(lifetime, 7 * 24 * 60 * 60);
        assert_eq!(svc.token_expires_in(), 7 * 24 * 60 * 60);
        assert!(signed.expires_at() > Utc::now() + Duration::days(6));
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service("secret");
        let claims = Claims {
            sub: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            iat: (Utc::now() - Duration::days(8)).timestamp(),
            exp: (Utc::now() - Duration::days(1)).timestamp(),
        };
        let token = svc.sign(&claims).unwrap();

        assert!(matches!(svc.validate_token(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let token = service("secret-a")
            .generate_session_token(Uuid::new_v4())
            .unwrap()
            .token;

        assert!(matches!(
            service("secret-b").validate_token(&token),
            Err(JwtError::DecodingError(_))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let svc = service("very-secret-value");
        assert!(!format!("{svc:?}").contains("very-secret-value"));
    }
}
