//! GitHub repository URL validation and normalization.
//!
//! Scans are only ever submitted for URLs that pass this check; a malformed
//! URL is reported inline and no request leaves the client. SSH remotes are
//! normalized to HTTPS and a `/tree/<branch>` suffix is split off into an
//! explicit branch.

use regex::Regex;
use std::sync::OnceLock;

/// A validated repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Normalized `https://github.com/<owner>/<repo>` URL.
    pub url: String,
    pub owner: String,
    pub repo: String,
    /// Branch taken from a `/tree/<branch>` suffix, if the URL carried one.
    pub branch: Option<String>,
}

fn github_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^https://github\.com/(?P<owner>[A-Za-z0-9_.-]+)/(?P<repo>[A-Za-z0-9_.-]+?)(?:\.git)?(?:/tree/(?P<branch>[^/]+))?/?$",
        )
        .expect("static pattern must compile")
    })
}

/// Parses a user-entered repository URL. Accepts HTTPS GitHub URLs (with an
/// optional `.git` or `/tree/<branch>` suffix) and `git@github.com:` SSH
/// remotes.
pub fn parse(input: &str) -> Result<RepoRef, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Please enter a repository URL.".to_string());
    }

    // Normalize SSH to HTTPS before matching.
    let normalized = trimmed.replace("git@github.com:", "https://github.com/");

    let captures = github_pattern()
        .captures(&normalized)
        .ok_or_else(|| "Please enter a valid GitHub URL.".to_string())?;

    let owner = captures["owner"].to_string();
    let repo = captures["repo"].to_string();
    let branch = captures.name("branch").map(|m| m.as_str().to_string());

    Ok(RepoRef {
        url: format!("https://github.com/{owner}/{repo}"),
        owner,
        repo,
        branch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_https_url() {
        let parsed = parse("https://github.com/acme/widgets").expect("valid");
        assert_eq!(parsed.url, "https://github.com/acme/widgets");
        assert_eq!(parsed.owner, "acme");
        assert_eq!(parsed.repo, "widgets");
        assert_eq!(parsed.branch, None);
    }

    #[test]
    fn strips_git_suffix_and_trailing_slash() {
        let parsed = parse("https://github.com/acme/widgets.git").expect("valid");
        assert_eq!(parsed.url, "https://github.com/acme/widgets");
        let parsed = parse("https://github.com/acme/widgets/").expect("valid");
        assert_eq!(parsed.repo, "widgets");
    }

    #[test]
    fn extracts_branch_from_tree_suffix() {
        let parsed = parse("https://github.com/acme/widgets/tree/develop").expect("valid");
        assert_eq!(parsed.url, "https://github.com/acme/widgets");
        assert_eq!(parsed.branch.as_deref(), Some("develop"));
    }

    #[test]
    fn normalizes_ssh_remote() {
        let parsed = parse("git@github.com:acme/widgets.git").expect("valid");
        assert_eq!(parsed.url, "https://github.com/acme/widgets");
    }

    #[test]
    fn rejects_non_github_input() {
        assert!(parse("").is_err());
        assert!(parse("not a url").is_err());
        assert!(parse("https://gitlab.com/acme/widgets").is_err());
        assert!(parse("https://github.com/only-owner").is_err());
    }
}
