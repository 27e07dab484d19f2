//! Hostname helpers shared by the probes and the enumeration stage

/// Canonical form of a hostname: trimmed, lowercase, without the trailing root dot
///
/// Returns `None` for input that is empty after normalization.
///
/// # Examples
///
/// ```
/// use subnode::utils::normalize_hostname;
///
/// assert_eq!(normalize_hostname(" WWW.Example.COM. ").as_deref(), Some("www.example.com"));
/// assert_eq!(normalize_hostname("   "), None);
/// ```
pub fn normalize_hostname(raw: &str) -> Option<String> {
    let host = raw.trim().trim_end_matches('.');
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// Extract the hostname from one line of HTTP probe output
///
/// The probe prints a URL per live host (`https://www.example.com:8443/login`);
/// scheme, port and path are discarded. Lines without a scheme are parsed as
/// if they were `http://` URLs.
pub fn host_from_url(line: &str) -> Option<String> {
    let token = line.split_whitespace().next()?;

    let parsed = url::Url::parse(token)
        .ok()
        .filter(|u| u.host_str().is_some())
        .or_else(|| url::Url::parse(&format!("http://{token}")).ok())?;

    let host = parsed.host_str()?;
    // IPv6 hosts come back bracketed
    normalize_hostname(host.trim_start_matches('[').trim_end_matches(']'))
}

/// Pick the root domain `host` belongs to
///
/// A host belongs to a root if it equals it or ends with `.` + root. Matching
/// ignores case and trailing dots; the longest matching root wins so that
/// `a.dev.example.com` lands under `dev.example.com` when both are tracked.
pub fn assign_root_domain<'a>(host: &str, roots: &'a [String]) -> Option<&'a str> {
    let host = normalize_hostname(host)?;

    roots
        .iter()
        .filter_map(|root| {
            let normalized = normalize_hostname(root)?;
            let matches = host == normalized
                || (host.len() > normalized.len()
                    && host.ends_with(normalized.as_str())
                    && host.as_bytes()[host.len() - normalized.len() - 1] == b'.');
            matches.then_some((normalized.len(), root.as_str()))
        })
        .max_by_key(|(len, _)| *len)
        .map(|(_, root)| root)
}
