//! Remote configuration and fetch.

use std::cell::RefCell;

use git2::{Cred, FetchOptions, Oid, RemoteCallbacks};
use secrecy::{ExposeSecret, SecretString};

use crate::Repository;
use crate::error::{Error, Result};

/// Give up after this many rejected credentials in a single fetch.
const MAX_CREDENTIAL_ATTEMPTS: u8 = 3;

/// Username and password supplied for an HTTP(S) remote.
///
/// The password is held as a `SecretString` so it is zeroized on drop and
/// redacted from debug output.
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    pub password: SecretString,
}

/// Receives fetch progress and answers credential requests.
///
/// Both calls block the fetch until they return.
pub trait FetchCallbacks {
    /// Objects received and indexed so far, out of `total`.
    fn progress(&mut self, _received: usize, _indexed: usize, _total: usize) {}

    /// Supply a username/password for `url`, or `None` to give up.
    fn credentials(&mut self, _url: &str, _username: Option<&str>) -> Option<Credential> {
        None
    }

    /// The transfer ended, successfully or not.
    fn finished(&mut self) {}
}

/// Callbacks that report nothing and offer no credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFetchCallbacks;

impl FetchCallbacks for NoFetchCallbacks {}

impl Repository {
    /// URL of a configured remote.
    #[must_use]
    pub fn remote_url(&self, name: &str) -> Option<String> {
        self.inner()
            .find_remote(name)
            .ok()
            .and_then(|remote| remote.url().map(String::from))
    }

    /// Make sure `name` exists, creating it or repointing it when `url` is given.
    ///
    /// # Errors
    /// Returns `RemoteNotFound` if the remote is missing and no URL was given.
    pub fn ensure_remote(&self, name: &str, url: Option<&str>) -> Result<()> {
        let exists = self.inner().find_remote(name).is_ok();
        match (exists, url) {
            (true, Some(url)) => {
                self.inner().remote_set_url(name, url)?;
                tracing::debug!(remote = name, url, "updated remote url");
            }
            (true, None) => {}
            (false, Some(url)) => {
                self.inner().remote(name, url)?;
                tracing::debug!(remote = name, url, "created remote");
            }
            (false, None) => return Err(Error::RemoteNotFound(name.into())),
        }
        Ok(())
    }

    /// Fetch a remote using its configured refspecs.
    ///
    /// # Errors
    /// Returns `FetchFailed` if the transfer or authentication fails.
    pub fn fetch(&self, remote_name: &str, callbacks: &mut dyn FetchCallbacks) -> Result<()> {
        let mut remote = self
            .inner()
            .find_remote(remote_name)
            .map_err(|_| Error::RemoteNotFound(remote_name.into()))?;
        let config = self.inner().config().ok();
        let sink = RefCell::new(callbacks);

        let result = {
            let mut attempts = 0u8;
            let mut remote_callbacks = RemoteCallbacks::new();
            remote_callbacks.transfer_progress(|stats| {
                sink.borrow_mut().progress(
                    stats.received_objects(),
                    stats.indexed_objects(),
                    stats.total_objects(),
                );
                true
            });
            remote_callbacks.credentials(|url, username, allowed| {
                attempts += 1;
                if attempts > MAX_CREDENTIAL_ATTEMPTS {
                    return Err(git2::Error::from_str("too many authentication attempts"));
                }
                if allowed.is_ssh_key() {
                    if let Some(user) = username {
                        return Cred::ssh_key_from_agent(user);
                    }
                }
                if allowed.is_user_pass_plaintext() {
                    if let Some(cfg) = &config {
                        if let Ok(cred) = Cred::credential_helper(cfg, url, username) {
                            return Ok(cred);
                        }
                    }
                    if let Some(cred) = sink.borrow_mut().credentials(url, username) {
                        return Cred::userpass_plaintext(
                            &cred.username,
                            cred.password.expose_secret(),
                        );
                    }
                }
                Cred::default()
            });

            let mut options = FetchOptions::new();
            options.remote_callbacks(remote_callbacks);
            remote.fetch(&[] as &[&str], Some(&mut options), None)
        };

        sink.into_inner().finished();
        result.map_err(|e| Error::FetchFailed(e.message().to_string()))?;
        tracing::info!(remote = remote_name, "fetched");
        Ok(())
    }

    /// Commit a remote-tracking line points at after the last fetch.
    ///
    /// # Errors
    /// Returns `RefNotFound` if the remote has no such line.
    pub fn remote_line_commit(&self, remote: &str, line: &str) -> Result<Oid> {
        let refname = format!("refs/remotes/{remote}/{line}");
        self.inner()
            .refname_to_id(&refname)
            .map_err(|_| Error::RefNotFound(refname))
    }
}
