/// Public suffixes that span two labels
///
/// A full public-suffix list is overkill for documentation hosts; this
/// table covers the multi-part TLDs that actually show up in practice.
/// Hosted-docs platforms where each subdomain is an independent site are
/// included so `user.github.io` and `other.github.io` classify as
/// different registered domains.
const TWO_LABEL_SUFFIXES: &[&str] = &[
    "co.uk",
    "org.uk",
    "ac.uk",
    "gov.uk",
    "co.jp",
    "ne.jp",
    "com.au",
    "org.au",
    "com.br",
    "co.nz",
    "co.in",
    "co.za",
    "com.cn",
    "github.io",
    "gitlab.io",
    "readthedocs.io",
    "pages.dev",
    "netlify.app",
    "vercel.app",
];

/// Extracts the registered domain (eTLD+1) from a host
///
/// Used to classify same-site vs external links. IP addresses and
/// single-label hosts (e.g. `localhost`) are returned as-is.
///
/// # Examples
///
/// ```
/// use docharvest::url::registered_domain;
///
/// assert_eq!(registered_domain("docs.example.com"), "example.com");
/// assert_eq!(registered_domain("example.com"), "example.com");
/// assert_eq!(registered_domain("deep.docs.example.co.uk"), "example.co.uk");
/// assert_eq!(registered_domain("user.github.io"), "user.github.io");
/// assert_eq!(registered_domain("localhost"), "localhost");
/// ```
pub fn registered_domain(host: &str) -> String {
    let host = host.to_lowercase();

    // IPv4/IPv6 literals have no registrable parts
    if host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let last_two = labels[labels.len() - 2..].join(".");
    if TWO_LABEL_SUFFIXES.contains(&last_two.as_str()) {
        labels[labels.len() - 3..].join(".")
    } else {
        last_two
    }
}

/// Checks whether two hosts share a registered domain
pub fn same_registered_domain(a: &str, b: &str) -> bool {
    registered_domain(a) == registered_domain(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_domain() {
        assert_eq!(registered_domain("example.com"), "example.com");
    }

    #[test]
    fn test_subdomain() {
        assert_eq!(registered_domain("docs.example.com"), "example.com");
        assert_eq!(registered_domain("api.v2.example.com"), "example.com");
    }

    #[test]
    fn test_uppercase_host() {
        assert_eq!(registered_domain("DOCS.Example.COM"), "example.com");
    }

    #[test]
    fn test_two_label_suffix() {
        assert_eq!(registered_domain("example.co.uk"), "example.co.uk");
        assert_eq!(registered_domain("docs.example.co.uk"), "example.co.uk");
    }

    #[test]
    fn test_hosted_docs_platforms() {
        assert_eq!(registered_domain("user.github.io"), "user.github.io");
        assert_eq!(
            registered_domain("project.readthedocs.io"),
            "project.readthedocs.io"
        );
    }

    #[test]
    fn test_single_label() {
        assert_eq!(registered_domain("localhost"), "localhost");
    }

    #[test]
    fn test_ip_address() {
        assert_eq!(registered_domain("127.0.0.1"), "127.0.0.1");
        assert_eq!(registered_domain("192.168.10.20"), "192.168.10.20");
    }

    #[test]
    fn test_same_registered_domain() {
        assert!(same_registered_domain("docs.example.com", "example.com"));
        assert!(same_registered_domain(
            "docs.example.com",
            "api.example.com"
        ));
        assert!(!same_registered_domain("example.com", "example.org"));
        assert!(!same_registered_domain(
            "user.github.io",
            "other.github.io"
        ));
    }
}
