use std::time::Duration;

use pretty_assertions::assert_eq;
use sentiview_client::{AuthScheme, ClientSettings, API_URL_ENV, DEBOUNCE_MS_ENV, POLL_MS_ENV};

#[test]
fn defaults_match_the_dashboard() {
    let settings = ClientSettings::default();
    assert_eq!(settings.base_url, "http://localhost:8000/api/");
    assert_eq!(settings.jobs_path, "analyze");
    assert_eq!(settings.poll_interval, Duration::from_millis(3000));
    assert_eq!(settings.debounce_window, Duration::from_millis(300));
    assert_eq!(settings.cache_ttl, Duration::from_secs(300));
    assert_eq!(settings.auth_scheme, AuthScheme::Token);
}

#[test]
fn auth_scheme_formats_header() {
    assert_eq!(AuthScheme::Token.header_value("abc"), "Token abc");
    assert_eq!(AuthScheme::Bearer.header_value("abc"), "Bearer abc");
}

// The only test in this binary that touches the environment.
#[test]
fn environment_overrides_apply_and_bad_values_are_ignored() {
    std::env::set_var(API_URL_ENV, " http://example.test/api/ ");
    std::env::set_var(POLL_MS_ENV, "250");
    std::env::set_var(DEBOUNCE_MS_ENV, "soon");

    let settings = ClientSettings::from_env();

    std::env::remove_var(API_URL_ENV);
    std::env::remove_var(POLL_MS_ENV);
    std::env::remove_var(DEBOUNCE_MS_ENV);

    assert_eq!(settings.base_url, "http://example.test/api/");
    assert_eq!(settings.poll_interval, Duration::from_millis(250));
    assert_eq!(settings.debounce_window, Duration::from_millis(300));
}
