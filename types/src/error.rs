use dioxus::prelude::ServerFnError;
use serde_json::json;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Build an [`Error`] from a format string, like `anyhow!`.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_anyhow($crate::internal_anyhow_dont_use!($($arg)*))
    };
}

/// An error with a status code attached.
///
/// Like `anyhow::Error`, this deliberately does not implement
/// `std::error::Error`, so that any standard error can be converted with `?`.
pub struct Error {
    inner: anyhow::Error,
    status: u16,
}

impl Error {
    pub const INTERNAL: u16 = 500;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const BAD_GATEWAY: u16 = 502;

    #[doc(hidden)]
    pub fn from_anyhow(inner: anyhow::Error) -> Self {
        Self {
            inner,
            status: Self::INTERNAL,
        }
    }

    pub fn msg(message: impl std::fmt::Display + Send + Sync + 'static) -> Self {
        Self::from_anyhow(anyhow::Error::msg(message.to_string()))
    }

    pub fn unauthorized(message: impl std::fmt::Display + Send + Sync + 'static) -> Self {
        Self::msg(message).with_status(Self::UNAUTHORIZED)
    }

    pub fn forbidden(message: impl std::fmt::Display + Send + Sync + 'static) -> Self {
        Self::msg(message).with_status(Self::FORBIDDEN)
    }

    pub fn bad_request(message: impl std::fmt::Display + Send + Sync + 'static) -> Self {
        Self::msg(message).with_status(Self::BAD_REQUEST)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Wrap the error with a higher-level message, keeping the status.
    pub fn context(self, context: impl std::fmt::Display + Send + Sync + 'static) -> Self {
        Self {
            inner: self.inner.context(context),
            status: self.status,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Self::UNAUTHORIZED
    }

    /// Every message in the chain, outermost first.
    pub fn chain(&self) -> Vec<String> {
        self.inner.chain().map(|e| e.to_string()).collect()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.inner, f)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:?}", self.status, self.inner)
    }
}

impl<E> From<E> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::from_anyhow(error.into())
    }
}

impl From<Error> for anyhow::Error {
    fn from(error: Error) -> Self {
        error.inner
    }
}

impl From<Error> for ServerFnError {
    fn from(error: Error) -> Self {
        let chain = error.chain();
        let backtrace = error.inner.backtrace().to_string();
        ServerFnError::ServerError {
            message: error.to_string(),
            code: error.status,
            details: Some(json!({
                "chain": chain,
                "backtrace": backtrace,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_errors_convert_with_internal_status() {
        fn parse(s: &str) -> Result<u32> {
            Ok(s.parse::<u32>()?)
        }

        let error = parse("nope").unwrap_err();
        assert_eq!(error.status(), Error::INTERNAL);
        assert!(!error.to_string().is_empty());
    }

    #[test]
    fn err_macro_formats() {
        let error = err!("user {} not found", 7);
        assert_eq!(error.to_string(), "user 7 not found");
    }

    #[test]
    fn context_keeps_status_and_chain() {
        let error = Error::unauthorized("session expired").context("loading users");
        assert!(error.is_unauthorized());
        assert_eq!(error.chain(), vec!["loading users", "session expired"]);
    }

    #[test]
    fn converts_into_server_error() {
        let error = Error::forbidden("admins only");
        match ServerFnError::from(error) {
            ServerFnError::ServerError {
                message,
                code,
                details,
            } => {
                assert_eq!(message, "admins only");
                assert_eq!(code, 403);
                let chain = details.unwrap()["chain"].clone();
                assert_eq!(chain, json!(["admins only"]));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
