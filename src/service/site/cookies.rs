use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use snafu::{OptionExt as _, ResultExt as _};

use super::*;

/// One entry of a browser cookie export. Only the fields we read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Cookie {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CookieFile {
    List(Vec<Cookie>),
    Wrapped { cookies: Vec<Cookie> },
}

/// Cookies to present to one site domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSet {
    pub domain: String,
    pub cookies: BTreeMap<String, String>,
}

pub fn load(path: &Path, domain: Option<&str>, session_cookie: &str) -> Result<CookieSet> {
    let content = std::fs::read_to_string(path).context(ReadCookiesSnafu { path })?;
    let file: CookieFile = serde_json::from_str(&content).context(CookieFormatSnafu { path })?;

    let cookies = match file {
        CookieFile::List(cookies) | CookieFile::Wrapped { cookies } => cookies,
    };

    select(&cookies, domain, session_cookie)
}

/// Pick the site domain and the cookies that apply to it.
///
/// The domain is `domain` if given, else the one the session cookie was issued for, else the
/// most common cookie domain.
pub fn select(cookies: &[Cookie], domain: Option<&str>, session_cookie: &str) -> Result<CookieSet> {
    let chosen = match domain.map(clean_domain).filter(|domain| !domain.is_empty()) {
        Some(domain) => domain.to_string(),
        None => session_domain(cookies, session_cookie)
            .or_else(|| most_common_domain(cookies))
            .context(NoDomainSnafu)?,
    };

    let applicable: BTreeMap<String, String> = cookies
        .iter()
        .filter(|cookie| {
            let domain = cookie.domain.as_deref().map(clean_domain).unwrap_or_default();
            !domain.is_empty() && domains_overlap(&chosen, domain)
        })
        .filter_map(|cookie| Some((cookie.name.clone()?, cookie.value.clone()?)))
        .collect();

    snafu::ensure!(!applicable.is_empty(), NoCookiesSnafu { domain: chosen });

    Ok(CookieSet {
        domain: chosen,
        cookies: applicable,
    })
}

fn clean_domain(domain: &str) -> &str {
    domain.trim_start_matches('.')
}

fn domains_overlap(chosen: &str, domain: &str) -> bool {
    chosen == domain
        || chosen.ends_with(&format!(".{domain}"))
        || domain.ends_with(&format!(".{chosen}"))
}

fn session_domain(cookies: &[Cookie], session_cookie: &str) -> Option<String> {
    cookies
        .iter()
        .filter(|cookie| cookie.name.as_deref() == Some(session_cookie))
        .filter_map(|cookie| cookie.domain.as_deref().map(clean_domain))
        .find(|domain| !domain.is_empty())
        .map(str::to_string)
}

/// Most frequent domain, the first one seen winning ties.
fn most_common_domain(cookies: &[Cookie]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for domain in cookies.iter().filter_map(|cookie| cookie.domain.as_deref()) {
        let domain = clean_domain(domain);
        if domain.is_empty() {
            continue;
        }

        match counts.iter_mut().find(|(seen, _)| *seen == domain) {
            Some((_, count)) => *count += 1,
            None => counts.push((domain, 1)),
        }
    }

    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (domain, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((domain, count)),
        })
        .map(|(domain, _)| domain.to_string())
}
