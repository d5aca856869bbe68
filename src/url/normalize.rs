use crate::UrlError;
use url::Url;

/// Canonicalizes a raw address into an absolute http(s) address
///
/// # Canonicalization Steps
///
/// 1. Trim surrounding whitespace; reject empty input
/// 2. If no scheme is present, prefix `https://` (and `www.` when
///    `add_www` is set and the host does not already carry it)
/// 3. Reject any scheme other than http/https
/// 4. Lowercase the scheme and host
/// 5. Remove the fragment
///
/// The path, query and trailing slash are left exactly as given so the
/// original form survives for display and storage. Canonicalizing an already
/// canonical address returns it unchanged.
///
/// # Arguments
///
/// * `raw` - The address as typed or read from a file
/// * `add_www` - Whether to add `www.` to scheme-less input
///
/// # Examples
///
/// ```
/// use torcrawl::url::canonicalize;
///
/// assert_eq!(canonicalize("torcrawl.com", false).unwrap(), "https://torcrawl.com");
/// assert_eq!(canonicalize("torcrawl.com", true).unwrap(), "https://www.torcrawl.com");
/// assert_eq!(
///     canonicalize("HTTP://Example.COM/Page#top", false).unwrap(),
///     "http://example.com/Page"
/// );
/// ```
pub fn canonicalize(raw: &str, add_www: bool) -> Result<String, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Malformed("empty address".to_string()));
    }

    let with_scheme = match trimmed.split_once("://") {
        Some((scheme, _)) if is_http_scheme(scheme) => trimmed.to_string(),
        Some((scheme, _)) if is_scheme_like(scheme) => {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                scheme
            )));
        }
        _ => {
            if add_www && !trimmed.to_ascii_lowercase().starts_with("www.") {
                format!("https://www.{}", trimmed)
            } else {
                format!("https://{}", trimmed)
            }
        }
    };

    let (scheme, rest) = with_scheme
        .split_once("://")
        .ok_or_else(|| UrlError::Malformed(with_scheme.clone()))?;

    // Fragment never takes part in addressing
    let rest = rest.split('#').next().unwrap_or_default();

    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    if authority.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    let authority = match authority.rsplit_once('@') {
        Some((userinfo, host)) => format!("{}@{}", userinfo, host.to_lowercase()),
        None => authority.to_lowercase(),
    };

    let canonical = format!("{}://{}{}", scheme.to_lowercase(), authority, tail);

    let parsed = Url::parse(&canonical).map_err(|e| UrlError::Parse(e.to_string()))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(canonical)
}

/// Resolves a link found on a page into an absolute address
///
/// Rules are tried in order:
///
/// 1. Absolute http(s) link: canonicalized and returned as-is. Whether it is
///    in scope is decided by the classifier, not here.
/// 2. Protocol-relative (`//host/path`): inherits the scheme of `base`.
/// 3. Root-relative (`/path`): joined onto the scheme and host of `base`.
/// 4. Anything else: standard relative resolution against `base`
///    (`bob.html`, `../up`, `?page=2`).
///
/// Returns `None` when the link cannot be turned into an http(s) address,
/// e.g. `javascript:` links or a base that is not itself a valid address.
///
/// # Examples
///
/// ```
/// use torcrawl::url::resolve;
///
/// let base = "https://torcrawl.com/";
/// assert_eq!(resolve("bob.html", base).as_deref(), Some("https://torcrawl.com/bob.html"));
/// assert_eq!(resolve("/sundance", base).as_deref(), Some("https://torcrawl.com/sundance"));
/// assert_eq!(resolve("javascript:void(0)", base), None);
/// ```
pub fn resolve(link: &str, base: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    if is_absolute_http(link) {
        return canonicalize(link, false).ok();
    }

    let base_url = Url::parse(base).ok()?;
    if !is_http_scheme(base_url.scheme()) {
        return None;
    }

    if let Some(rest) = link.strip_prefix("//") {
        return canonicalize(&format!("{}://{}", base_url.scheme(), rest), false).ok();
    }

    if link.starts_with('/') {
        let joined = format!("{}{}", origin(&base_url)?, link);
        return canonicalize(&joined, false).ok();
    }

    let mut joined = base_url.join(link).ok()?;
    if !is_http_scheme(joined.scheme()) {
        return None;
    }
    joined.set_fragment(None);
    Some(joined.to_string())
}

/// Returns `scheme://host[:port]` for a parsed address
pub fn origin(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Returns true if the link carries an explicit http or https scheme
pub fn is_absolute_http(link: &str) -> bool {
    link.split_once("://")
        .map(|(scheme, _)| is_http_scheme(scheme))
        .unwrap_or(false)
}

fn is_http_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

fn is_scheme_like(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
