//! Small stateless helpers shared across components.
use crate::errors::*;
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const USER_AGENT: &str = concat!("repocat/", env!("CARGO_PKG_VERSION"));

/// Builds the blocking HTTP client shared by a [`crate::download::Download`].
///
/// `connect_timeout` is the config-driven `connection_timeout` key
/// (spec §5, default 5s); `proxy` is the `set_proxy` value.
pub fn http_client(connect_timeout: Duration, proxy: Option<&str>) -> Result<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::ClientBuilder::new()
        .user_agent(USER_AGENT)
        .connect_timeout(connect_timeout);
    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

/// Expands `$releasever`/`$basearch`/`$srcdir` style variables in `text`,
/// looking each name up through `lookup`. Unknown variables are left
/// untouched (spec §4.1: substitution is textual, not validated).
pub fn expand_vars(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let rest = &text[i + 1..];
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            if end > 0 {
                let name = &rest[..end];
                if let Some(value) = lookup(name) {
                    out.push_str(&value);
                    i += 1 + end;
                    continue;
                }
            }
        }
        let ch = text[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_variables() {
        let got = expand_vars("$releasever-$basearch", |name| match name {
            "releasever" => Some("15".to_string()),
            "basearch" => Some("i386".to_string()),
            _ => None,
        });
        assert_eq!(got, "15-i386");
    }

    #[test]
    fn leaves_unknown_variables_untouched() {
        let got = expand_vars("$foo/bar", |_| None);
        assert_eq!(got, "$foo/bar");
    }
}
