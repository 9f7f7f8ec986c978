/// Broad category of a failure, used for exit codes and batch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Node or store unreachable.
    Connection,
    /// Conflicting or missing selectors on the command line.
    Usage,
    /// Cluster, miner, deal or sector not found.
    Lookup,
    /// Malformed date, address, CID or config file.
    Format,
    /// A SQL statement failed.
    Persistence,
    /// The node answered with a JSON-RPC error or an undecodable payload.
    Rpc,
    /// Local file or stdout failure.
    Io,
    /// Explicit exit code without a message.
    Exit,
}

impl ErrorKind {
    pub fn default_exit_code(self) -> u8 {
        match self {
            ErrorKind::Usage => 2,
            ErrorKind::Format => 3,
            ErrorKind::Lookup => 4,
            ErrorKind::Connection => 5,
            ErrorKind::Persistence => 6,
            ErrorKind::Rpc => 7,
            ErrorKind::Io => 8,
            ErrorKind::Exit => 1,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            exit_code: kind.default_exit_code(),
            message: message.into(),
        }
    }

    /// An error that only carries a process exit code.
    ///
    /// Binaries exit with `code` and print nothing.
    pub fn exit(code: u8) -> Self {
        Self {
            kind: ErrorKind::Exit,
            exit_code: code,
            message: String::new(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, message)
    }

    pub fn lookup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lookup, message)
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, message)
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence, message)
    }

    pub fn rpc(method: &str, message: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::Rpc, format!("rpc {method}: {message}"))
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefix the message with extra context, keeping kind and exit code.
    pub fn context(mut self, prefix: impl std::fmt::Display) -> Self {
        self.message = format!("{prefix}: {}", self.message);
        self
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::persistence(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::connection(format!("chain request failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_distinct_exit_codes() {
        assert_eq!(AppError::usage("x").exit_code(), 2);
        assert_eq!(AppError::format("x").exit_code(), 3);
        assert_eq!(AppError::lookup("x").exit_code(), 4);
        assert_eq!(AppError::exit(42).exit_code(), 42);
        assert!(AppError::exit(42).message().is_empty());
    }

    #[test]
    fn rpc_errors_name_the_method() {
        let err = AppError::rpc("ChainHead", "boom").context("info");
        assert_eq!(err.to_string(), "info: rpc ChainHead: boom");
        assert_eq!(err.kind(), ErrorKind::Rpc);
    }
}
