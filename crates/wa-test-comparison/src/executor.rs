//! Request execution seam
//!
//! How a response is produced (in-process dispatch, HTTP, a recorded
//! transcript) is up to the caller; the harness only needs bytes back.

use wa_normalize::RequestParams;

/// Executes an API request and returns the raw response body
pub trait RequestExecutor {
    fn execute(&self, method: &str, params: &RequestParams) -> anyhow::Result<Vec<u8>>;
}

impl<F> RequestExecutor for F
where
    F: Fn(&str, &RequestParams) -> anyhow::Result<Vec<u8>>,
{
    fn execute(&self, method: &str, params: &RequestParams) -> anyhow::Result<Vec<u8>> {
        self(method, params)
    }
}
