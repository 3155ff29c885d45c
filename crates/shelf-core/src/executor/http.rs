//! Single-stream HTTP GET executor backed by libcurl.
//!
//! Streams the response body into the destination's `.part` file, reports
//! progress as bytes land on disk and renames into place on success. Error
//! responses (>= 400) never reach the file.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use crate::config::ShelfConfig;
use crate::control::AbortToken;
use crate::storage::StorageWriter;

use super::{ProgressSink, TransferError, TransferExecutor, TransferRequest};

const MAX_REDIRECTIONS: u32 = 10;

/// Options applied to every curl handle.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    /// TCP connect timeout (None = libcurl default).
    pub connect_timeout: Option<Duration>,
    pub follow_redirects: bool,
    pub user_agent: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            follow_redirects: true,
            user_agent: None,
        }
    }
}

impl From<&ShelfConfig> for CurlOptions {
    fn from(cfg: &ShelfConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout_secs.map(Duration::from_secs),
            follow_redirects: cfg.follow_redirects,
            user_agent: cfg.user_agent.clone(),
        }
    }
}

/// Executor that downloads `http`/`https` URLs with one curl easy handle per transfer.
#[derive(Debug, Clone, Default)]
pub struct CurlExecutor {
    opts: CurlOptions,
}

impl CurlExecutor {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    fn configure(&self, easy: &mut curl::easy::Easy, url: &str) -> Result<(), curl::Error> {
        easy.url(url)?;
        if self.opts.follow_redirects {
            easy.follow_location(true)?;
            easy.max_redirections(MAX_REDIRECTIONS)?;
        }
        if let Some(timeout) = self.opts.connect_timeout {
            easy.connect_timeout(timeout)?;
        }
        if let Some(ref ua) = self.opts.user_agent {
            easy.useragent(ua)?;
        }
        // >= 400 ends the transfer before any body byte reaches the writer.
        easy.fail_on_error(true)?;
        easy.progress(true)?;
        Ok(())
    }

    /// Runs the GET, writing into `storage`. Returns the number of body bytes written.
    fn perform(
        &self,
        request: &TransferRequest,
        storage: &mut StorageWriter,
        progress: &dyn ProgressSink,
        abort: &AbortToken,
    ) -> Result<u64, TransferError> {
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, &request.url)?;

        let storage = RefCell::new(storage);
        let storage_error: Cell<Option<std::io::Error>> = Cell::new(None);
        let announced: Cell<Option<u64>> = Cell::new(None);
        let result = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                if abort.is_aborted() {
                    return Ok(0);
                }
                let mut storage = storage.borrow_mut();
                match storage.append(data) {
                    Ok(()) => {
                        progress.report(storage.bytes_written(), announced.get());
                        Ok(data.len())
                    }
                    Err(e) => {
                        storage_error.set(Some(e));
                        Ok(0) // abort transfer
                    }
                }
            })?;
            transfer.progress_function(|dltotal, _, _, _| {
                if abort.is_aborted() {
                    return false;
                }
                if dltotal > 0.0 {
                    announced.set(Some(dltotal as u64));
                }
                true
            })?;
            transfer.perform()
        };

        if abort.is_aborted() {
            return Err(TransferError::Aborted);
        }
        if let Some(e) = storage_error.take() {
            return Err(TransferError::Storage(e));
        }
        if let Err(e) = &result {
            if e.is_http_returned_error() {
                return Err(TransferError::Http(easy.response_code()?));
            }
        }
        result?;

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransferError::Http(code));
        }

        let received = storage.borrow().bytes_written();
        let expected = easy.content_length_download()?;
        if expected > 0.0 && received != expected as u64 {
            return Err(TransferError::PartialTransfer {
                expected: expected as u64,
                received,
            });
        }
        progress.report(received, (expected > 0.0).then_some(expected as u64));
        Ok(received)
    }
}

impl TransferExecutor for CurlExecutor {
    fn transfer(
        &self,
        request: &TransferRequest,
        progress: &dyn ProgressSink,
        abort: &AbortToken,
    ) -> Result<u64, TransferError> {
        check_url(&request.url)?;
        let mut storage = StorageWriter::create(&request.destination)?;
        match self.perform(request, &mut storage, progress, abort) {
            Ok(written) => {
                storage.finalize(&request.destination)?;
                Ok(written)
            }
            Err(e) => {
                storage.discard();
                Err(e)
            }
        }
    }
}

/// Only absolute `http`/`https` URLs are accepted.
fn check_url(raw: &str) -> Result<(), TransferError> {
    let parsed = url::Url::parse(raw).map_err(|e| TransferError::InvalidUrl(format!("{raw}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(TransferError::InvalidUrl(format!(
            "{raw}: unsupported scheme {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_url_accepts_http_only() {
        assert!(check_url("https://example.com/book.pdf").is_ok());
        assert!(check_url("http://127.0.0.1:8080/a").is_ok());
        assert!(matches!(
            check_url("ftp://example.com/book.pdf"),
            Err(TransferError::InvalidUrl(_))
        ));
        assert!(matches!(
            check_url("not a url"),
            Err(TransferError::InvalidUrl(_))
        ));
    }

    #[test]
    fn options_from_config() {
        let cfg = ShelfConfig {
            connect_timeout_secs: Some(15),
            follow_redirects: false,
            user_agent: Some("shelf/0.1".into()),
            ..ShelfConfig::default()
        };
        let opts = CurlOptions::from(&cfg);
        assert_eq!(opts.connect_timeout, Some(Duration::from_secs(15)));
        assert!(!opts.follow_redirects);
        assert_eq!(opts.user_agent.as_deref(), Some("shelf/0.1"));
    }
}
