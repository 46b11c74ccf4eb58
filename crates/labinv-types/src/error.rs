use thiserror::Error;

/// Errors related to chemical operations.
#[derive(Debug, Error)]
pub enum ChemicalError {
    #[error("chemical not found")]
    NotFound,

    #[error("chemical '{0}' already exists")]
    DuplicateName(String),

    #[error("invalid chemical: {0}")]
    Validation(String),

    #[error(transparent)]
    Qr(#[from] QrError),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to study operations.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error("study not found")]
    NotFound,

    #[error("study with code '{0}' already exists")]
    DuplicateCode(String),

    #[error("invalid study: {0}")]
    Validation(String),

    #[error(transparent)]
    Qr(#[from] QrError),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to user accounts.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("username '{0}' already exists")]
    UsernameTaken(String),

    #[error("invalid user: {0}")]
    Validation(String),

    #[error("account '{0}' cannot be deleted")]
    Protected(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors raised while authenticating a request or a login attempt.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("account lookup failed: {0}")]
    Backend(String),
}

/// Errors raised by CSV upload validation and import.
#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("Please select a CSV file to upload")]
    EmptyFile,

    #[error("Only CSV files are allowed, got '{0}'")]
    NotCsv(String),

    #[error("File size {size} bytes exceeds the limit of {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("File is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("CSV file has no header row")]
    MissingHeader,

    #[error("CSV header is missing required column '{0}'")]
    MissingColumn(String),

    #[error("No valid {0} records found in CSV file")]
    NoValidRecords(String),

    #[error("CSV parse error: {0}")]
    Parse(String),

    #[error("CSV write error: {0}")]
    Write(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to QR code generation.
#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR rendering failed: {0}")]
    Render(String),
}

/// Errors from repository operations (used by trait definitions in labinv-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
