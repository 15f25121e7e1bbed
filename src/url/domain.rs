use url::{Host, Url};

/// Extracts the host of a URL in the form allowed-domain patterns use
///
/// Domain names are lowercased, IPv4 hosts are returned in dotted form and
/// IPv6 hosts keep their brackets. URLs without a host (`data:`, `mailto:`)
/// have no domain.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The normalized host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::{Host, Url};
/// use atc_spider::url::extract_domain;
///
/// let url = Url::parse("https://WWW.WHOCC.NO/atc_ddd_index/").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.whocc.no".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let domain = match url.host()? {
        Host::Domain(name) => name.to_ascii_lowercase(),
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => format!("[{}]", addr),
    };
    Some(domain)
}
