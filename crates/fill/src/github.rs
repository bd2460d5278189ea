// The paging and client code here was adapted from Glacier.
//
// Permission is hereby granted, free of charge, to any
// person obtaining a copy of this software and associated
// documentation files (the "Software"), to deal in the
// Software without restriction, including without
// limitation the rights to use, copy, modify, merge,
// publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software
// is furnished to do so, subject to the following
// conditions:
//
// The above copyright notice and this permission notice
// shall be included in all copies or substantial portions
// of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF
// ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED
// TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A
// PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT
// SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY
// CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR
// IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! `IssueTracker` backed by the GitHub REST API.
//!
//! Large result sets are paged. Pages are requested one at a time as the
//! caller consumes them, following the `rel="next"` entry of the `Link` header.

use labeldb::{
    Issue, IssueTracker, Issues, Label, RepoId, Repository, StateFilter, SyncError, Token,
};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{
    blocking::{Client, Response},
    header::{HeaderMap, ACCEPT, LINK},
    StatusCode, Url,
};
use serde::de::DeserializeOwned;
use tracing::debug;

pub(crate) const DEFAULT_API_URL: &str = "https://api.github.com";

const PER_PAGE: &str = "100";

static RE_NEXT_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<([^>]+)>;\s*rel="next""#).unwrap());

pub(crate) struct GitHub {
    client: Client,
    api_url: String,
    token: Token,
}

impl GitHub {
    pub(crate) fn new(token: &Token, api_url: &str) -> Result<Self, SyncError> {
        let client = Client::builder()
            .user_agent("labeldb")
            .build()
            .map_err(remote_error)?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.clone(),
        })
    }

    fn send(&self, url: &str) -> Result<Response, SyncError> {
        debug!("GET {url}");
        self.client
            .get(url)
            .bearer_auth(self.token.expose())
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .map_err(remote_error)
    }

    fn fetch_page<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<(Vec<T>, Option<String>), SyncError> {
        let res = self.send(url)?;
        if !res.status().is_success() {
            return Err(status_error(res.status(), res.headers(), url));
        }
        let next = res
            .headers()
            .get(LINK)
            .and_then(|link| link.to_str().ok())
            .and_then(next_page_url);
        let items = res.json().map_err(remote_error)?;
        Ok((items, next))
    }

    fn repo_url(&self, repo: &Repository, endpoint: &str) -> String {
        format!("{}/repos/{}/{endpoint}", self.api_url, repo.full_name)
    }

    fn labels_url(&self, repo: &Repository) -> Result<Url, SyncError> {
        Url::parse_with_params(&self.repo_url(repo, "labels"), &[("per_page", PER_PAGE)])
            .map_err(|e| SyncError::Config(format!("bad API URL {}: {e}", self.api_url)))
    }

    fn issues_url(
        &self,
        repo: &Repository,
        labels: &[Label],
        state: StateFilter,
    ) -> Result<Url, SyncError> {
        let mut params = vec![("state", state.as_str().to_string())];
        if !labels.is_empty() {
            let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
            params.push(("labels", names.join(",")));
        }
        params.push(("per_page", PER_PAGE.to_string()));
        Url::parse_with_params(&self.repo_url(repo, "issues"), &params)
            .map_err(|e| SyncError::Config(format!("bad API URL {}: {e}", self.api_url)))
    }
}

impl IssueTracker for GitHub {
    fn repository(&self, id: &RepoId) -> Result<Repository, SyncError> {
        let url = format!("{}/repos/{}/{}", self.api_url, id.owner, id.name);
        let res = self.send(&url)?;
        match res.status() {
            StatusCode::NOT_FOUND => Err(SyncError::NotFound(id.to_string())),
            status if status.is_success() => res.json().map_err(remote_error),
            status => Err(status_error(status, res.headers(), &url)),
        }
    }

    fn list_labels(&self, repo: &Repository) -> Result<Vec<Label>, SyncError> {
        Pages::<Label>::new(self, self.labels_url(repo)?.into()).collect()
    }

    fn list_issues(
        &self,
        repo: &Repository,
        labels: &[Label],
        state: StateFilter,
    ) -> Result<Issues<'_>, SyncError> {
        let url = self.issues_url(repo, labels, state)?;
        Ok(Box::new(Pages::<Issue>::new(self, url.into())))
    }
}

/// Lazily walks a paged listing.
struct Pages<'a, T> {
    github: &'a GitHub,
    next: Option<String>,
    buffer: std::vec::IntoIter<T>,
}

impl<'a, T> Pages<'a, T> {
    fn new(github: &'a GitHub, first: String) -> Self {
        Self {
            github,
            next: Some(first),
            buffer: Vec::new().into_iter(),
        }
    }
}

impl<T: DeserializeOwned> Iterator for Pages<'_, T> {
    type Item = Result<T, SyncError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item));
            }
            // After an error `next` stays empty, ending the iteration.
            let url = self.next.take()?;
            match self.github.fetch_page(&url) {
                Ok((items, next)) => {
                    self.buffer = items.into_iter();
                    self.next = next;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn next_page_url(link: &str) -> Option<String> {
    RE_NEXT_PAGE
        .captures(link)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

fn status_error(status: StatusCode, headers: &HeaderMap, url: &str) -> SyncError {
    let rate_limited = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    match status {
        StatusCode::UNAUTHORIZED => SyncError::Auth(format!("token rejected by {url}")),
        StatusCode::TOO_MANY_REQUESTS => SyncError::RemoteQuery(format!("rate limited by {url}")),
        StatusCode::FORBIDDEN if rate_limited => {
            SyncError::RemoteQuery(format!("rate limited by {url}"))
        }
        status => SyncError::RemoteQuery(format!("{url} returned {status}")),
    }
}

fn remote_error(e: reqwest::Error) -> SyncError {
    SyncError::RemoteQuery(e.to_string())
}
