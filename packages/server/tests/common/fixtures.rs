//! Worker scripts and request bodies shared by the integration tests.

use serde_json::json;

/// Writes two addresses with a blank line between them, then exits 0.
pub const SCENARIO_WORKER: &str = r#"
echo "scraping $(cat config.json)"
printf 'jane@acme.com\n\njohn@acme.com\n' > final_combined_emails.txt
"#;

/// Fails after printing some diagnostics.
pub const FAILING_WORKER: &str = r#"
echo "Error loading configuration"
echo "Traceback (most recent call last)" >&2
exit 1
"#;

/// Exits 0 without producing a result file.
pub const SILENT_WORKER: &str = "exit 0\n";

/// Derives an address from the domain in its own config.json after a pause,
/// so overlapping jobs would pick up each other's config if slots were shared.
pub const DOMAIN_ECHO_WORKER: &str = r#"
domain=$(sed -n 's/.*"domain":"\([^"]*\)".*/\1/p' config.json)
sleep 0.3
echo "contact@$domain" > final_combined_emails.txt
"#;

/// Exits 0 with one undecodable byte between two good addresses.
pub const INVALID_UTF8_WORKER: &str = r#"
printf 'jane@acme.com\n\377bad\njohn@acme.com\n' > final_combined_emails.txt
"#;

/// Echoes its config back as the single "address", so the callback shows
/// which config the worker actually read.
pub const CONFIG_ECHO_WORKER: &str = r#"
cat config.json > final_combined_emails.txt
"#;

/// Percent-encode a URL for use as a form value.
pub fn form_encode(value: &str) -> String {
    value.replace('%', "%25").replace(':', "%3A").replace('/', "%2F")
}

pub fn scenario_job(webhook: &str) -> serde_json::Value {
    json!({
        "recordId": "42",
        "names": ["Jane Doe"],
        "domain": "acme.com",
        "niche": "sales",
        "webhook": webhook,
    })
}
