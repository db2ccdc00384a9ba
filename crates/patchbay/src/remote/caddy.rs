//! Caddy site file rendering
//!
//! One file per hostname under the remote config directory, named after
//! the fully-qualified site address.

/// File name for a site's config fragment
pub fn site_file_name(fqdn: &str) -> String {
    format!("{}.caddy", fqdn)
}

/// Render the site block appended to the per-hostname file
pub fn site_block(fqdn: &str, upstream: &str) -> String {
    format!(
        "{fqdn} {{
    reverse_proxy {upstream}
    header {{
        Permissions-Policy interest-cohort=()
        Strict-Transport-Security max-age=31536000;
        X-Content-Type-Options nosniff
        X-Frame-Options DENY
        Referrer-Policy no-referrer-when-downgrade
    }}
}}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_file_name() {
        assert_eq!(
            site_file_name("myservice.apps.example.com"),
            "myservice.apps.example.com.caddy"
        );
    }

    #[test]
    fn test_site_block_contents() {
        let block = site_block("myservice.apps.example.com", "100.64.0.1:80");
        assert!(block.starts_with("myservice.apps.example.com {"));
        assert!(block.contains("reverse_proxy 100.64.0.1:80"));
        assert!(block.contains("Strict-Transport-Security max-age=31536000;"));
        assert!(block.ends_with("}\n"));
    }
}
