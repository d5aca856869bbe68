use url::Url;

/// Returns the site identity of an address: lowercase host without a leading
/// `www.`, followed by `:port` when a non-default port is present
///
/// Two addresses with the same host key belong to the same crawl scope.
///
/// # Examples
///
/// ```
/// use torcrawl::url::host_key;
///
/// assert_eq!(host_key("https://WWW.Example.com/a"), Some("example.com".to_string()));
/// assert_eq!(host_key("http://127.0.0.1:8080/"), Some("127.0.0.1:8080".to_string()));
/// assert_eq!(host_key("mailto:someone@example.com"), None);
/// ```
pub fn host_key(address: &str) -> Option<String> {
    let url = Url::parse(address.trim()).ok()?;
    let host = url.host_str().filter(|h| !h.is_empty())?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns the comparison key used to collapse equivalent addresses
///
/// The key is the host key followed by the path (without a trailing slash)
/// and the query. Scheme, `www.`, host case and trailing slashes do not
/// change the key, so `https://www.Example.com/a/` and `http://example.com/a`
/// are the same node.
///
/// Values that are not http(s) addresses (phone numbers, mail addresses,
/// relative references) are keyed by their trimmed text.
///
/// # Examples
///
/// ```
/// use torcrawl::url::dedup_key;
///
/// assert_eq!(dedup_key("https://www.Example.com/a/"), dedup_key("http://example.com/a"));
/// assert_ne!(dedup_key("https://example.com/a?x=1"), dedup_key("https://example.com/a?x=2"));
/// ```
pub fn dedup_key(address: &str) -> String {
    let trimmed = address.trim();
    let parsed = match Url::parse(trimmed) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => url,
        _ => return trimmed.to_string(),
    };

    let Some(host) = host_key(trimmed) else {
        return trimmed.to_string();
    };

    let path = parsed.path().trim_end_matches('/');
    match parsed.query() {
        Some(query) => format!("{}{}?{}", host, path, query),
        None => format!("{}{}", host, path),
    }
}
