//! Template repository loading.
//! Resolves where a template lives and clones git repositories with
//! libgit2, optionally at a branch or tag and with token authentication.

use crate::error::Result;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{Cred, CredentialType, FetchOptions, RemoteCallbacks, Repository};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Represents the source location of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Local filesystem template path
    FileSystem(PathBuf),
    /// Git repository URL (HTTPS or SSH)
    Git(String),
}

impl std::fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateSource::FileSystem(path) => {
                write!(f, "local path: '{}'", path.display())
            }
            TemplateSource::Git(repo) => write!(f, "git repository: '{repo}'"),
        }
    }
}

impl TemplateSource {
    /// Git URLs become [`TemplateSource::Git`], anything else a local path.
    pub fn from_string(s: &str) -> Self {
        if is_git_url(s) {
            Self::Git(s.to_string())
        } else {
            Self::FileSystem(PathBuf::from(s))
        }
    }
}

/// Whether `s` looks like a remote git repository location.
pub fn is_git_url(s: &str) -> bool {
    if let Ok(url) = Url::parse(s) {
        return matches!(url.scheme(), "https" | "http" | "git" | "ssh") && url.host().is_some();
    }
    // git@host:owner/repo
    match s.strip_prefix("git@") {
        Some(rest) => rest.split_once(':').is_some_and(|(host, path)| {
            !host.is_empty() && !path.is_empty()
        }),
        None => false,
    }
}

/// A remote template repository and what to check out of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitRepository {
    pub url: String,
    pub branch: Option<String>,
    pub tag: Option<String>,
    /// Access token for private repositories over HTTPS.
    pub token: Option<String>,
}

impl GitRepository {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self { url: url.into(), ..Self::default() }
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch.filter(|b| !b.is_empty());
        self
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag.filter(|t| !t.is_empty());
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Repository name: the last path segment of the URL without `.git`.
    pub fn name(&self) -> String {
        let url = self.url.trim_end_matches('/');
        let last = url.rsplit(['/', ':']).next().unwrap_or(url);
        let name = last.trim_end_matches(".git");
        if name.is_empty() {
            "template".to_string()
        } else {
            name.to_string()
        }
    }

    /// Clones the repository into `path` and checks out the requested
    /// branch or tag.
    ///
    /// # Errors
    /// * `Error::Git2Error` if cloning or checking out fails
    pub fn clone_into<P: AsRef<Path>>(&self, path: P) -> Result<Repository> {
        let path = path.as_ref();
        debug!("Cloning repository '{}' to '{}'.", self.url, path.display());

        let token = self.token.clone();
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            if allowed_types.contains(CredentialType::SSH_KEY) {
                let home = std::env::var("HOME").unwrap_or_default();
                return Cred::ssh_key(
                    username_from_url.unwrap_or("git"),
                    None,
                    &Path::new(&home).join(".ssh").join("id_rsa"),
                    None,
                );
            }
            match &token {
                Some(token) => Cred::userpass_plaintext("cloney", token),
                None => Cred::default(),
            }
        });

        let mut fetch_opts = FetchOptions::new();
        fetch_opts.remote_callbacks(callbacks);

        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_opts);
        if let Some(branch) = &self.branch {
            debug!("Checking out branch '{branch}'.");
            builder.branch(branch);
        }
        let repository = builder.clone(&self.url, path)?;

        if let Some(tag) = &self.tag {
            debug!("Checking out tag '{tag}'.");
            checkout_tag(&repository, tag)?;
        }
        Ok(repository)
    }

    /// Reads one file of the repository through a throwaway clone.
    ///
    /// # Errors
    /// * `Error::Git2Error` if cloning fails
    /// * `Error::IoError` if the file cannot be read
    pub fn read_file<P: AsRef<Path>>(&self, relative: P) -> Result<String> {
        let workspace = tempfile::tempdir()?;
        let clone_path = workspace.path().join(self.name());
        self.clone_into(&clone_path)?;
        Ok(fs::read_to_string(clone_path.join(relative))?)
    }
}

fn checkout_tag(repository: &Repository, tag: &str) -> Result<()> {
    let commit = repository.revparse_single(&format!("refs/tags/{tag}"))?.peel_to_commit()?;
    repository.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;
    repository.set_head_detached(commit.id())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_source_display() {
        let fs_source = TemplateSource::FileSystem(PathBuf::from("/path/to/template"));
        assert_eq!(format!("{}", fs_source), "local path: '/path/to/template'");

        let git_source = TemplateSource::from_string("git@github.com:user/repo");
        assert_eq!(format!("{}", git_source), "git repository: 'git@github.com:user/repo'");
    }

    #[test]
    fn test_is_git_url() {
        assert!(is_git_url("https://github.com/ArthurSudbrackIbarra/cloney-template.git"));
        assert!(is_git_url("http://gitlab.local/group/repo"));
        assert!(is_git_url("ssh://git@github.com/user/repo.git"));
        assert!(is_git_url("git@github.com:user/repo.git"));
        assert!(!is_git_url("./my-template"));
        assert!(!is_git_url("/tmp/template"));
        assert!(!is_git_url("git@nohost"));
    }

    #[test]
    fn test_repository_name() {
        assert_eq!(GitRepository::new("https://github.com/user/my-template.git").name(), "my-template");
        assert_eq!(GitRepository::new("https://github.com/user/my-template/").name(), "my-template");
        assert_eq!(GitRepository::new("git@github.com:user/repo.git").name(), "repo");
        assert_eq!(GitRepository::new("git@github.com:repo.git").name(), "repo");
    }

    #[test]
    fn test_builder_drops_empty_values() {
        let repo = GitRepository::new("https://x.org/a/b")
            .with_branch(Some(String::new()))
            .with_tag(Some("v1.0.0".into()))
            .with_token(None);
        assert_eq!(repo.branch, None);
        assert_eq!(repo.tag.as_deref(), Some("v1.0.0"));
        assert_eq!(repo.token, None);
    }
}
