#![no_main]

use admin_service::crypto::SigningKey;
use admin_service::services::token_validator::TokenValidator;
use libfuzzer_sys::fuzz_target;
use std::sync::{Arc, OnceLock};

fn validator() -> &'static TokenValidator {
    static VALIDATOR: OnceLock<TokenValidator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        let key = SigningKey::initialize(Some("fuzzing-secret")).expect("configured key");
        TokenValidator::new(Arc::new(key))
    })
}

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the validator, whatever the outcome.
    if let Ok(token) = std::str::from_utf8(data) {
        let validator = validator();
        let verified = validator.parse_and_verify(token);
        let _ = validator.validate_access(token);
        let _ = validator.validate_for_user(token, "admin");

        // Nothing that fails verification may count as live.
        if verified.is_err() {
            assert!(validator.is_expired(token));
        }
    }
});
