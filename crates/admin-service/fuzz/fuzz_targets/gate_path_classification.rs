#![no_main]

use admin_service::middleware::auth::{requires_authentication, LOGIN_PATH};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(path) = std::str::from_utf8(data) {
        let protected = requires_authentication(path);

        if !path.starts_with("/admin/") || path == LOGIN_PATH {
            assert!(!protected);
        }
    }
});
