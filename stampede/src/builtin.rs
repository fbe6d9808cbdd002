use std::time::Duration;

use serde_json::json;
use stampede_core::{AuthRole, HttpMethod, RoleLogin, Scenario};

use crate::scenario_file::LoadedSuite;

const TEST_EMAIL: &str = "load-test@example.com";
const TEST_PASSWORD: &str = "testpassword123";

/// The built-in mixed-traffic suite used when no scenario file is given:
/// one read-heavy and one write-heavy path per major backend area.
pub(crate) fn suite() -> LoadedSuite {
    let scenarios = vec![
        Scenario::new("health_check", HttpMethod::Get, "/api/health")
            .timeout(Duration::from_secs(5)),
        Scenario::new("auth_login", HttpMethod::Post, "/api/auth/login")
            .body(json!({"email": TEST_EMAIL, "password": TEST_PASSWORD})),
        Scenario::new("user_profile", HttpMethod::Get, "/api/users/profile")
            .auth(AuthRole::User)
            .timeout(Duration::from_secs(5)),
        Scenario::new("booking_create", HttpMethod::Post, "/api/bookings")
            .auth(AuthRole::User)
            .body(json!({
                "serviceType": "emergency",
                "location": {"latitude": 30.0444, "longitude": 31.2357},
                "description": "Synthetic booking traffic"
            })),
        Scenario::new("booking_list", HttpMethod::Get, "/api/bookings")
            .auth(AuthRole::User)
            .query("page", "1")
            .query("limit", "10")
            .timeout(Duration::from_secs(5)),
        Scenario::new("mechanic_search", HttpMethod::Get, "/api/mechanics/search")
            .query("lat", "30.0444")
            .query("lng", "31.2357")
            .query("radius", "10")
            .timeout(Duration::from_secs(5)),
        Scenario::new("payment_process", HttpMethod::Post, "/api/payments/process")
            .auth(AuthRole::User)
            .body(json!({
                "bookingId": "booking-synthetic",
                "amount": 100,
                "paymentMethod": "card"
            }))
            .timeout(Duration::from_secs(15)),
    ];

    let auth = vec![RoleLogin::new(
        AuthRole::User,
        "/api/auth/login",
        json!({"email": TEST_EMAIL, "password": TEST_PASSWORD}),
    )];

    LoadedSuite {
        base_url: None,
        scenarios,
        auth,
        params: std::collections::HashMap::new(),
    }
}
