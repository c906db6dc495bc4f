//! Parses a `mirrorlist.txt` body: one base URI per line, `#`-comments
//! and blank lines ignored (spec §4.4, §6 "Media Discovery").
pub fn parse_uris(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.rsplit_once("/repodata/")
                .map(|(base, _)| base)
                .unwrap_or(line)
                .trim_end_matches('/')
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let body = "# generated by mirrormanager\n\nhttp://a.example/fedora/41\nhttp://b.example/fedora/41/\n";
        assert_eq!(
            parse_uris(body),
            vec![
                "http://a.example/fedora/41".to_string(),
                "http://b.example/fedora/41".to_string(),
            ]
        );
    }

    #[test]
    fn strips_repodata_suffix() {
        let body = "http://a.example/fedora/41/repodata/repomd.xml\n";
        assert_eq!(parse_uris(body), vec!["http://a.example/fedora/41".to_string()]);
    }
}
