//! Property tests for token validation

use histoires_auth::{AuthConfig, AuthError, TokenValidator};
use proptest::prelude::*;

fn validator() -> TokenValidator {
    TokenValidator::new(&AuthConfig::new(
        "property-test-secret-0123456789abcdef",
        "authenticated",
    ))
    .unwrap()
}

proptest! {
    #[test]
    fn prop_garbage_never_authenticates(token in "\\PC{0,200}") {
        prop_assert!(validator().validate(&token).is_err());
    }

    #[test]
    fn prop_three_segment_garbage_is_invalid(
        a in "[A-Za-z0-9_-]{1,40}",
        b in "[A-Za-z0-9_-]{1,40}",
        c in "[A-Za-z0-9_-]{1,40}",
    ) {
        let token = format!("{a}.{b}.{c}");
        prop_assert_eq!(validator().validate(&token).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn prop_non_bearer_headers_are_missing_token(scheme in "[A-Za-z]{1,10}", value in "[A-Za-z0-9]{0,20}") {
        prop_assume!(!scheme.eq_ignore_ascii_case("bearer"));
        let header = format!("{scheme} {value}");
        prop_assert_eq!(validator().validate_header(&header).unwrap_err(), AuthError::MissingToken);
    }
}
