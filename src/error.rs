//! Error types for the labplan batch-plan engine.

use thiserror::Error;

/// Record store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Archive not found: {0}")]
    NotFound(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid archive {file}: {message}")]
    InvalidArchive { file: String, message: String },

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures while applying one parameter value onto a record.
///
/// These never abort a plan run; the caller logs them and skips the parameter.
#[derive(Debug, Error)]
pub enum SetValueError {
    #[error("Empty parameter path")]
    EmptyPath,

    #[error("Unknown section definition: {0}")]
    UnknownSection(String),

    #[error("Section {section} has no field {field}")]
    NoSuchField { section: String, field: String },

    #[error("Invalid list index: {0}")]
    InvalidIndex(String),

    #[error("List index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Sub-section {0} is not set")]
    UnsetSubSection(String),

    #[error("Cannot descend into {0}: not a section or list")]
    NotASection(String),

    #[error("Cannot assign a value to sub-section {0}")]
    NotAssignable(String),

    #[error("Not a number: {0}")]
    InvalidNumber(String),

    #[error("Not a boolean: {0}")]
    InvalidBool(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Unit {unit} is not compatible with {expected}")]
    IncompatibleUnit { unit: String, expected: String },

    #[error("Solution holder {0} has no solution reference to snapshot")]
    SolutionUnset(String),

    #[error("Reference resolution failed: {0}")]
    Storage(#[from] StorageError),
}

/// Plan-level errors: precondition and parameter-shape violations.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("The experimental plan has already been created. This can not be undone without deleting the files! If you did that uncheck the plan_is_created checkbox.")]
    AlreadyCreated,

    #[error("Substrates per subbatch must be greater than zero")]
    ZeroSubbatchSize,

    #[error("Number of substrates is {substrates} and substrates per subbatch is {per_subbatch}, which does not divide!")]
    IndivisibleSubstrates { substrates: u32, per_subbatch: u32 },

    #[error("Parameter {0} has no values!")]
    ParameterWithoutValues(String),

    #[error("Parameter {path} has too many values! ({values} values for {subbatches} subbatches)")]
    TooManyValues {
        path: String,
        values: usize,
        subbatches: usize,
    },

    #[error("Not the correct amount of varied parameters given for tensor product: {actual} combinations for {expected} subbatches")]
    ProductMismatch { expected: usize, actual: usize },

    #[error("Step {0} has no process reference")]
    MissingTemplate(usize),

    #[error("Plan has no batch id with a lab id")]
    MissingBatchId,

    #[error("Plan has no solar cell properties (set a standard plan or the properties directly)")]
    MissingSolarCellProperties,

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

/// Instrument file parsing errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unrecognized file format: {0}")]
    UnknownFormat(String),

    #[error("Missing header row {row} ({label})")]
    MissingHeader { row: usize, label: &'static str },

    #[error("Invalid number in {context}: {value}")]
    InvalidNumber { context: String, value: String },

    #[error("Malformed table {table}: {message}")]
    MalformedTable { table: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

/// Top-level errors surfaced by the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Plan error: {0}")]
    PlanError(#[from] PlanError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown section definition: {0}")]
    UnknownSection(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
