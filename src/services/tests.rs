#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use http::header::AUTHORIZATION;
    use http::{HeaderMap, HeaderValue};
    use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
    use serde_json::json;

    use crate::errors::{AuthError, GatewayError};
    use crate::services::{
        decide, Claims, DenyReason, GateDecision, GateRequest, JwtValidator, ServiceRegistry,
        TokenValidator,
    };
    use crate::config::{JwtAlgorithm, JwtConfig, DEFAULT_PUBLIC_PATHS};

    const SECRET: &str = "test-secret-key-for-testing-only";

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: SECRET.to_string(),
            algorithm: JwtAlgorithm::HS256,
            issuer: None,
        }
    }

    fn token_expiring_at(exp: u64, secret: &str) -> String {
        let claims = Claims {
            sub: Some("alice".to_string()),
            exp,
            iat: Some(get_current_timestamp()),
            iss: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_token() -> String {
        token_expiring_at(get_current_timestamp() + 3600, SECRET)
    }

    fn expired_token() -> String {
        token_expiring_at(get_current_timestamp() - 3600, SECRET)
    }

    fn signed(claims: &serde_json::Value) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    fn decide_jwt(path: &str, headers: &HeaderMap) -> GateDecision {
        let validator = JwtValidator::new(&jwt_config());
        decide(&GateRequest::new(path, headers), &DEFAULT_PUBLIC_PATHS, &validator)
    }

    #[test]
    fn login_is_allowed_without_credentials() {
        let headers = HeaderMap::new();
        assert_eq!(decide_jwt("/api/v1/auth/login", &headers), GateDecision::Allow);
    }

    #[test]
    fn protected_path_without_header_is_denied() {
        let headers = HeaderMap::new();
        assert_eq!(
            decide_jwt("/api/v1/user/123", &headers),
            GateDecision::Deny(DenyReason::MissingCredential)
        );
    }

    #[test]
    fn protected_path_with_valid_token_is_allowed() {
        let headers = headers_with_auth(&format!("Bearer {}", valid_token()));
        assert_eq!(decide_jwt("/api/v1/user/123", &headers), GateDecision::Allow);
    }

    #[test]
    fn protected_path_with_expired_token_is_denied() {
        let headers = headers_with_auth(&format!("Bearer {}", expired_token()));
        assert_eq!(
            decide_jwt("/api/v1/user/123", &headers),
            GateDecision::Deny(DenyReason::InvalidCredential)
        );
    }

    #[test]
    fn eureka_paths_are_public() {
        let headers = HeaderMap::new();
        assert_eq!(decide_jwt("/eureka/apps", &headers), GateDecision::Allow);
    }

    #[test]
    fn public_paths_ignore_malformed_headers() {
        let headers = headers_with_auth("Bearer not-a-jwt");
        assert_eq!(decide_jwt("/api/v1/auth/register", &headers), GateDecision::Allow);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(b"\xffbad").unwrap());
        assert_eq!(decide_jwt("/api/v1/auth/login", &headers), GateDecision::Allow);
    }

    #[test]
    fn public_match_is_a_substring_match() {
        let headers = HeaderMap::new();
        assert!(decide_jwt("/proxy/eureka", &headers).is_allowed());
        assert!(!decide_jwt("/api/v1/auth/logout", &headers).is_allowed());
    }

    #[test]
    fn token_signed_with_other_secret_is_denied() {
        let token = token_expiring_at(get_current_timestamp() + 3600, "some-other-secret");
        let headers = headers_with_auth(&format!("Bearer {}", token));
        assert_eq!(
            decide_jwt("/api/v2/restaurants", &headers),
            GateDecision::Deny(DenyReason::InvalidCredential)
        );
    }

    #[test]
    fn garbage_token_is_denied() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(
            decide_jwt("/api/v1/user/1", &headers),
            GateDecision::Deny(DenyReason::InvalidCredential)
        );
    }

    #[test]
    fn bearer_prefix_is_stripped_before_validation() {
        let seen = Mutex::new(Vec::new());
        let validator = |token: &str| -> Result<(), AuthError> {
            seen.lock().unwrap().push(token.to_string());
            Ok(())
        };
        let public: Vec<String> = Vec::new();

        let headers = headers_with_auth("Bearer abc.def.ghi");
        decide(&GateRequest::new("/private", &headers), &public, &validator);

        let headers = headers_with_auth("abc.def.ghi");
        decide(&GateRequest::new("/private", &headers), &public, &validator);

        let headers = headers_with_auth("bearer abc");
        decide(&GateRequest::new("/private", &headers), &public, &validator);

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["abc.def.ghi", "abc.def.ghi", "bearer abc"]
        );
    }

    #[test]
    fn public_paths_never_reach_the_validator() {
        let validator = |_: &str| -> Result<(), AuthError> { panic!("validator must not run") };
        let headers = headers_with_auth("Bearer anything");
        let decision = decide(
            &GateRequest::new("/api/v1/auth/login", &headers),
            &DEFAULT_PUBLIC_PATHS,
            &validator,
        );
        assert_eq!(decision, GateDecision::Allow);
    }

    #[test]
    fn first_authorization_value_is_used() {
        let validator = |token: &str| -> Result<(), AuthError> {
            if token == "good" {
                Ok(())
            } else {
                Err(AuthError::InvalidSignature)
            }
        };
        let mut headers = HeaderMap::new();
        headers.append(AUTHORIZATION, HeaderValue::from_static("Bearer good"));
        headers.append(AUTHORIZATION, HeaderValue::from_static("Bearer bad"));

        let decision = decide(&GateRequest::new("/private", &headers), &[], &validator);
        assert_eq!(decision, GateDecision::Allow);
    }

    #[test]
    fn panicking_validator_fails_closed() {
        let validator = |_: &str| -> Result<(), AuthError> { panic!("boom") };
        let headers = headers_with_auth("Bearer abc");
        let decision = decide(&GateRequest::new("/private", &headers), &[], &validator);
        assert_eq!(decision, GateDecision::Deny(DenyReason::InvalidCredential));
    }

    #[test]
    fn non_ascii_header_is_denied() {
        let validator = |_: &str| -> Result<(), AuthError> { Ok(()) };
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xff").unwrap());
        let decision = decide(&GateRequest::new("/private", &headers), &[], &validator);
        assert_eq!(decision, GateDecision::Deny(DenyReason::InvalidCredential));
    }

    #[test]
    fn expired_token_maps_to_expired_error() {
        let validator = JwtValidator::new(&jwt_config());
        assert!(matches!(validator.validate(&expired_token()), Err(AuthError::Expired)));
        assert!(matches!(
            validator.validate(&token_expiring_at(get_current_timestamp() + 60, "wrong")),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn issuer_is_checked_when_configured() {
        let mut config = jwt_config();
        config.issuer = Some("user-service".to_string());
        let validator = JwtValidator::new(&config);

        // token_expiring_at issues without `iss`
        assert!(validator.validate(&valid_token()).is_err());

        let claims = Claims {
            sub: Some("bob".to_string()),
            exp: get_current_timestamp() + 3600,
            iat: None,
            iss: Some("user-service".to_string()),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(validator.claims(&token).unwrap().sub.as_deref(), Some("bob"));
    }

    #[test]
    fn registry_round_robins_instances() {
        let mut upstreams = HashMap::new();
        upstreams.insert(
            "user-service".to_string(),
            vec!["http://a:1".to_string(), "http://b:2".to_string()],
        );
        let registry = ServiceRegistry::new(&upstreams);

        assert!(registry.contains("USER-SERVICE"));
        assert_eq!(registry.resolve("USER-SERVICE").unwrap(), "http://a:1");
        assert_eq!(registry.resolve("user-service").unwrap(), "http://b:2");
        assert_eq!(registry.resolve("USER-SERVICE").unwrap(), "http://a:1");
    }

    #[test]
    fn registry_rejects_unknown_service() {
        let registry = ServiceRegistry::new(&HashMap::new());
        assert!(matches!(
            registry.resolve("RESTAURANT-SERVICE"),
            Err(GatewayError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn token_expired_seconds_ago_is_denied() {
        let token = token_expiring_at(get_current_timestamp() - 30, SECRET);
        let headers = headers_with_auth(&format!("Bearer {}", token));
        assert_eq!(
            decide_jwt("/api/v1/user/123", &headers),
            GateDecision::Deny(DenyReason::InvalidCredential)
        );
    }

    #[test]
    fn token_not_yet_valid_is_denied() {
        let now = get_current_timestamp();
        let token = signed(&json!({ "sub": "a", "exp": now + 7200, "nbf": now + 3600 }));
        let headers = headers_with_auth(&format!("Bearer {}", token));
        assert_eq!(
            decide_jwt("/api/v1/user/123", &headers),
            GateDecision::Deny(DenyReason::InvalidCredential)
        );
    }

    #[test]
    fn token_already_valid_by_nbf_is_allowed() {
        let now = get_current_timestamp();
        let token = signed(&json!({ "sub": "a", "exp": now + 3600, "nbf": now - 10 }));
        let headers = headers_with_auth(&format!("Bearer {}", token));
        assert_eq!(decide_jwt("/api/v1/user/123", &headers), GateDecision::Allow);
    }

    #[test]
    fn token_without_subject_is_allowed() {
        let token = signed(&json!({ "exp": get_current_timestamp() + 3600 }));
        let headers = headers_with_auth(&format!("Bearer {}", token));
        assert_eq!(decide_jwt("/api/v1/user/123", &headers), GateDecision::Allow);
    }
}
