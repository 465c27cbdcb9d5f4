//! Remote file sources.
//!
//! A [`FileSource`] copies whatever is waiting upstream into the local
//! staging directory. The FTP implementation drives the blocking `suppaftp`
//! client on tokio's blocking pool.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use fileimport_common::settings::FtpSettings;
use fileimport_common::{ImportError, Result, listing_base_name, validate_file_name};
use suppaftp::{FtpError, FtpResult, FtpStream, Mode};
use tracing::{debug, error, info, instrument, warn};

/// Outcome of one fetch from the remote source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Files written into the staging directory
    pub downloaded: Vec<String>,
    /// Listing entries rejected as unsafe or not plain names
    pub skipped: Vec<String>,
    /// (file, reason) pairs for downloads that failed
    pub failed: Vec<(String, String)>,
}

impl FetchReport {
    pub fn is_empty(&self) -> bool {
        self.downloaded.is_empty() && self.failed.is_empty()
    }
}

/// Source of files to import
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Short name for logs and health output.
    fn name(&self) -> &str;

    /// Download every available file into `local_dir`, creating it if needed.
    async fn fetch_files(&self, local_dir: &Path) -> Result<FetchReport>;
}

/// Files listed in an FTP directory
pub struct FtpSource {
    settings: FtpSettings,
}

impl FtpSource {
    pub fn new(settings: FtpSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FtpSettings {
        &self.settings
    }
}

#[async_trait]
impl FileSource for FtpSource {
    fn name(&self) -> &str {
        "ftp"
    }

    #[instrument(skip_all, fields(host = %self.settings.host, remote_dir = %self.settings.remote_directory))]
    async fn fetch_files(&self, local_dir: &Path) -> Result<FetchReport> {
        tokio::fs::create_dir_all(local_dir)
            .await
            .map_err(|e| ImportError::io(local_dir, e))?;

        let settings = self.settings.clone();
        let local_dir = local_dir.to_path_buf();
        tokio::task::spawn_blocking(move || fetch_blocking(&settings, &local_dir))
            .await
            .map_err(|e| ImportError::Internal(format!("ftp fetch task failed: {e}")))?
    }
}

/// Split a raw `NLST` listing into safe file names and rejected entries.
pub fn plan_downloads(listing: &[String]) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::new();
    let mut skipped = Vec::new();
    for entry in listing {
        let name = listing_base_name(entry);
        match validate_file_name(name) {
            Ok(()) if !names.iter().any(|n: &String| n == name) => names.push(name.to_string()),
            Ok(()) => debug!(entry = %entry, "duplicate listing entry"),
            Err(e) => {
                warn!(entry = %entry, error = %e, "skipping listing entry");
                skipped.push(entry.clone());
            }
        }
    }
    (names, skipped)
}

fn connect(settings: &FtpSettings) -> Result<FtpStream> {
    let timeout = Duration::from_secs(settings.timeout_secs);
    let addrs: Vec<SocketAddr> = (settings.host.as_str(), settings.port)
        .to_socket_addrs()
        .map_err(|e| ImportError::ftp(format!("cannot resolve {}: {e}", settings.host)))?
        .collect();

    let stream = connect_any(&addrs, |addr| FtpStream::connect_timeout(addr, timeout)).map_err(
        |e| {
            ImportError::ftp(format!(
                "failed to connect to {}:{}: {e}",
                settings.host, settings.port
            ))
        },
    )?;
    if let Err(e) = stream.get_ref().set_read_timeout(Some(timeout)) {
        warn!(error = %e, "could not set FTP read timeout");
    }
    info!(host = %settings.host, port = settings.port, "connected to FTP server");
    Ok(stream)
}

/// Try each resolved address in order and keep the first connection that
/// succeeds. The error of the last attempt is returned when all fail.
fn connect_any<T, E, F>(addrs: &[SocketAddr], mut attempt: F) -> std::result::Result<T, String>
where
    E: std::fmt::Display,
    F: FnMut(SocketAddr) -> std::result::Result<T, E>,
{
    let mut last_error = None;
    for addr in addrs {
        match attempt(*addr) {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                debug!(%addr, error = %e, "connect attempt failed");
                last_error = Some(format!("{addr}: {e}"));
            }
        }
    }
    Err(last_error.unwrap_or_else(|| "no address resolved".to_string()))
}

fn fetch_blocking(settings: &FtpSettings, local_dir: &Path) -> Result<FetchReport> {
    let mut ftp = connect(settings)?;

    let result = download_all(&mut ftp, settings, local_dir);

    match ftp.quit() {
        Ok(()) => info!("logged out and disconnected from FTP server"),
        Err(e) => error!(error = %e, "failed to logout or disconnect from FTP server"),
    }

    result
}

fn download_all(ftp: &mut FtpStream, settings: &FtpSettings, local_dir: &Path) -> Result<FetchReport> {
    ftp.login(settings.username.as_str(), settings.password.as_str())
        .map_err(|e| {
            error!(user = %settings.username, "failed to login to FTP server");
            ImportError::ftp(format!("login failed for user {}: {e}", settings.username))
        })?;
    info!(user = %settings.username, "logged into FTP server");

    ftp.set_mode(Mode::Passive);
    ftp.cwd(settings.remote_directory.as_str()).map_err(|e| {
        ImportError::ftp(format!(
            "cannot change to remote directory {}: {e}",
            settings.remote_directory
        ))
    })?;
    info!(remote_dir = %settings.remote_directory, "changed working directory");

    let listing = listing_or_empty(ftp.nlst(None))?;

    let mut report = FetchReport::default();
    if listing.is_empty() {
        warn!(remote_dir = %settings.remote_directory, "no files found in remote directory");
        return Ok(report);
    }
    info!(count = listing.len(), "found files in remote directory");

    let (names, skipped) = plan_downloads(&listing);
    report.skipped = skipped;
    download_each(names, local_dir, &mut report, |name, target| {
        download_one(ftp, name, target)
    });

    Ok(report)
}

/// Servers such as proftpd and pure-ftpd answer `NLST` on an empty directory
/// with 450 or 550 instead of an empty listing.
fn is_empty_listing_reply(code: u32) -> bool {
    matches!(code, 450 | 550)
}

fn listing_or_empty(result: FtpResult<Vec<String>>) -> Result<Vec<String>> {
    match result {
        Ok(listing) => Ok(listing),
        Err(FtpError::UnexpectedResponse(response))
            if is_empty_listing_reply(response.status.code()) =>
        {
            debug!(status = response.status.code(), "NLST returned no listing");
            Ok(Vec::new())
        }
        Err(e) => Err(ImportError::ftp(format!("failed to list remote directory: {e}"))),
    }
}

/// Retrieve every planned file into `local_dir`. A failed file is recorded in
/// `report.failed` and the rest are still fetched.
fn download_each<F>(names: Vec<String>, local_dir: &Path, report: &mut FetchReport, mut retrieve: F)
where
    F: FnMut(&str, &Path) -> Result<u64>,
{
    for name in names {
        let target = local_dir.join(&name);
        match retrieve(&name, &target) {
            Ok(bytes) => {
                info!(file = %name, bytes, "retrieved file");
                report.downloaded.push(name);
            }
            Err(e) => {
                error!(file = %name, error = %e, "failed to retrieve file");
                if target.exists()
                    && let Err(e) = std::fs::remove_file(&target)
                {
                    warn!(file = %name, error = %e, "could not remove partial download");
                }
                report.failed.push((name, e.to_string()));
            }
        }
    }
}

/// Stream one file from the data connection straight to disk.
fn download_one(ftp: &mut FtpStream, name: &str, target: &Path) -> Result<u64> {
    let mut file = std::fs::File::create(target).map_err(|e| ImportError::io(target, e))?;
    let mut stream = ftp
        .retr_as_stream(name)
        .map_err(|e| ImportError::ftp(format!("RETR {name}: {e}")))?;

    let copied = io::copy(&mut stream, &mut file);
    // The transfer reply has to be read even after a failed copy.
    let finalized = ftp.finalize_retr_stream(stream);
    let bytes = copied.map_err(|e| ImportError::ftp(format!("RETR {name}: {e}")))?;
    finalized.map_err(|e| ImportError::ftp(format!("RETR {name}: {e}")))?;

    file.sync_all().map_err(|e| ImportError::io(target, e))?;
    Ok(bytes)
}
