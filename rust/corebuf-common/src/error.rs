use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    #[cold]
    pub fn allocation_failed(size: usize, align: usize) -> Error {
        Error(ErrorKind::AllocationFailed { size, align }.into())
    }

    #[cold]
    pub fn capacity_overflow(requested: usize, additional: usize) -> Error {
        Error(
            ErrorKind::CapacityOverflow {
                requested,
                additional,
            }
            .into(),
        )
    }

    /// Whether the error reports an allocator that could not satisfy a request,
    /// as opposed to a request that could never be expressed.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::AllocationFailed { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("allocation of {size} bytes with alignment {align} failed")]
    AllocationFailed { size: usize, align: usize },

    #[error("capacity overflow: {requested} elements plus {additional} more")]
    CapacityOverflow { requested: usize, additional: usize },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        let kind = match e.kind() {
            ErrorKind::AllocationFailed { .. } | ErrorKind::CapacityOverflow { .. } => {
                std::io::ErrorKind::OutOfMemory
            }
            ErrorKind::InvalidArgument { .. } => std::io::ErrorKind::InvalidInput,
            ErrorKind::InvalidOperation { .. } => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, e)
    }
}
