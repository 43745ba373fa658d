//! The validation error taxonomy.
//!
//! Every rejection maps onto an [`ErrorKind`] with a stable numeric code.
//! Codes are part of the node-to-node and node-to-client contract and must
//! never be renumbered.

use std::fmt;
use thiserror::Error;
use voc_core::{AssetId, GraphError, Hash};
use voc_vm::{GasError, VmError};

/// Errors that can occur while validating a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("internal error: {0}")]
    Internal(String),

    #[error("validation deadline exceeded")]
    DeadlineExceeded,

    #[error("spent output {0} not found")]
    OrphanInput(Hash),

    #[error("unsupported transaction version {version} (max {max})")]
    TxVersion { version: u64, max: u64 },

    #[error("transaction size {size} outside 1..={max}")]
    WrongTransactionSize { size: u64, max: u64 },

    #[error("block time {block_time} outside transaction range [{min_time}, {max_time}]")]
    BadTimeRange {
        block_time: u64,
        min_time: u64,
        max_time: u64,
    },

    #[error("non-standard program on a native asset entry")]
    NotStandardTx,

    #[error("wrong coinbase transaction: {0}")]
    WrongCoinbaseTransaction(&'static str),

    #[error("coinbase pays asset {0} instead of the native asset")]
    WrongCoinbaseAsset(AssetId),

    #[error("coinbase arbitrary data is {size} bytes (limit {limit})")]
    CoinbaseArbitraryOversize { size: usize, limit: usize },

    #[error("transaction has no results")]
    EmptyResults,

    #[error("asset mismatch: expected {expected}, found {found}")]
    MismatchedAssetId { expected: AssetId, found: AssetId },

    #[error("position mismatch: expected {expected}, found {found}")]
    MismatchedPosition { expected: u64, found: u64 },

    #[error("reference does not point back to its owner")]
    MismatchedReference,

    #[error("value mismatch: expected {expected}, found {found}")]
    MismatchedValue { expected: u64, found: u64 },

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("destination asset {0} has no source")]
    NoSource(AssetId),

    #[error("amount overflow")]
    Overflow,

    #[error("position {0} out of range")]
    Position(u64),

    #[error("asset {asset} is unbalanced by {residual}")]
    Unbalanced { asset: AssetId, residual: i64 },

    #[error("gas {used} exceeds the credit bought by the fee ({budget})")]
    OverGasCredit { used: u64, budget: u64 },

    #[error("gas calculation error")]
    GasCalculate,

    #[error("malformed reference: {0}")]
    MalformedReference(String),

    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("script failed: {0}")]
    Vm(#[from] VmError),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

impl From<GraphError> for ValidationError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::MalformedReference { .. } => Self::MalformedReference(err.to_string()),
            GraphError::MalformedPosition { position, .. } => Self::Position(position),
            GraphError::MissingField(_) => Self::MissingField("destination"),
            GraphError::WrongTransactionSize { size, max } => {
                Self::WrongTransactionSize { size, max }
            }
            GraphError::MalformedEncoding(msg) => Self::MalformedEncoding(msg),
        }
    }
}

impl From<GasError> for ValidationError {
    fn from(err: GasError) -> Self {
        match err {
            GasError::RunLimitExceeded { .. } => Self::Vm(VmError::RunLimitExceeded),
            GasError::GasCalculate => Self::GasCalculate,
            GasError::OverGasCredit { used, budget } => Self::OverGasCredit { used, budget },
            GasError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// Taxonomy groups, for routing rejections to the right audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Internal,
    Cancel,
    External,
    Structural,
    Temporal,
    Policy,
    Coinbase,
    Balance,
    Gas,
    Vm,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Internal => "internal",
            Category::Cancel => "cancel",
            Category::External => "external",
            Category::Structural => "structural",
            Category::Temporal => "temporal",
            Category::Policy => "policy",
            Category::Coinbase => "coinbase",
            Category::Balance => "balance",
            Category::Gas => "gas",
            Category::Vm => "vm",
        };
        f.write_str(name)
    }
}

/// The closed set of rejection causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Internal,
    DeadlineExceeded,
    OrphanInput,
    TxVersion,
    WrongTransactionSize,
    BadTimeRange,
    NotStandardTx,
    WrongCoinbaseTransaction,
    WrongCoinbaseAsset,
    CoinbaseArbitraryOversize,
    EmptyResults,
    MismatchedAssetId,
    MismatchedPosition,
    MismatchedReference,
    MismatchedValue,
    MissingField,
    NoSource,
    Overflow,
    Position,
    Unbalanced,
    OverGasCredit,
    GasCalculate,
    MalformedReference,
    MalformedEncoding,
    AltStackUnderflow,
    BadValue,
    WrongContext,
    DataStackUnderflow,
    DisallowedOpcode,
    DivideByZero,
    FalseResult,
    LongProgram,
    RangeError,
    ReturnExecuted,
    /// Exhausting the shared meter. Filed under the VM group with its code
    /// 770 whether an opcode or an entry visit ran out; budget failures found
    /// at settlement are `OverGasCredit` instead.
    RunLimitExceeded,
    ShortProgram,
    UnrecognizedToken,
    UnexpectedError,
    UnsupportedVersion,
    VerifyFailed,
}

impl ErrorKind {
    /// The stable wire code.
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::Internal => 0,
            ErrorKind::DeadlineExceeded => 1,
            ErrorKind::OrphanInput => 712,
            ErrorKind::TxVersion => 730,
            ErrorKind::WrongTransactionSize => 731,
            ErrorKind::BadTimeRange => 732,
            ErrorKind::NotStandardTx => 733,
            ErrorKind::WrongCoinbaseTransaction => 734,
            ErrorKind::WrongCoinbaseAsset => 735,
            ErrorKind::CoinbaseArbitraryOversize => 736,
            ErrorKind::EmptyResults => 737,
            ErrorKind::MismatchedAssetId => 738,
            ErrorKind::MismatchedPosition => 739,
            ErrorKind::MismatchedReference => 740,
            ErrorKind::MismatchedValue => 741,
            ErrorKind::MissingField => 742,
            ErrorKind::NoSource => 743,
            ErrorKind::Overflow => 744,
            ErrorKind::Position => 745,
            ErrorKind::Unbalanced => 746,
            ErrorKind::OverGasCredit => 747,
            ErrorKind::GasCalculate => 748,
            ErrorKind::MalformedReference => 749,
            ErrorKind::MalformedEncoding => 750,
            ErrorKind::AltStackUnderflow => 760,
            ErrorKind::BadValue => 761,
            ErrorKind::WrongContext => 762,
            ErrorKind::DataStackUnderflow => 763,
            ErrorKind::DisallowedOpcode => 764,
            ErrorKind::DivideByZero => 765,
            ErrorKind::FalseResult => 766,
            ErrorKind::LongProgram => 767,
            ErrorKind::RangeError => 768,
            ErrorKind::ReturnExecuted => 769,
            ErrorKind::RunLimitExceeded => 770,
            ErrorKind::ShortProgram => 771,
            ErrorKind::UnrecognizedToken => 772,
            ErrorKind::UnexpectedError => 773,
            ErrorKind::UnsupportedVersion => 774,
            ErrorKind::VerifyFailed => 775,
        }
    }

    pub fn category(self) -> Category {
        match self {
            ErrorKind::Internal => Category::Internal,
            ErrorKind::DeadlineExceeded => Category::Cancel,
            ErrorKind::OrphanInput => Category::External,
            ErrorKind::TxVersion
            | ErrorKind::WrongTransactionSize
            | ErrorKind::MalformedReference
            | ErrorKind::MalformedEncoding => Category::Structural,
            ErrorKind::BadTimeRange => Category::Temporal,
            ErrorKind::NotStandardTx => Category::Policy,
            ErrorKind::WrongCoinbaseTransaction
            | ErrorKind::WrongCoinbaseAsset
            | ErrorKind::CoinbaseArbitraryOversize => Category::Coinbase,
            ErrorKind::EmptyResults
            | ErrorKind::MismatchedAssetId
            | ErrorKind::MismatchedPosition
            | ErrorKind::MismatchedReference
            | ErrorKind::MismatchedValue
            | ErrorKind::MissingField
            | ErrorKind::NoSource
            | ErrorKind::Overflow
            | ErrorKind::Position
            | ErrorKind::Unbalanced => Category::Balance,
            ErrorKind::OverGasCredit | ErrorKind::GasCalculate => Category::Gas,
            ErrorKind::AltStackUnderflow
            | ErrorKind::BadValue
            | ErrorKind::WrongContext
            | ErrorKind::DataStackUnderflow
            | ErrorKind::DisallowedOpcode
            | ErrorKind::DivideByZero
            | ErrorKind::FalseResult
            | ErrorKind::LongProgram
            | ErrorKind::RangeError
            | ErrorKind::ReturnExecuted
            | ErrorKind::RunLimitExceeded
            | ErrorKind::ShortProgram
            | ErrorKind::UnrecognizedToken
            | ErrorKind::UnexpectedError
            | ErrorKind::UnsupportedVersion
            | ErrorKind::VerifyFailed => Category::Vm,
        }
    }

    /// Whether the same transaction might be accepted later, against a
    /// different state or with more time.
    pub fn is_temporary(self) -> bool {
        matches!(
            self,
            ErrorKind::Internal | ErrorKind::DeadlineExceeded | ErrorKind::OrphanInput
        )
    }

    /// Whether the rejection indicates a bug in this node rather than a bad
    /// transaction. Operators alert on these.
    pub fn is_internal(self) -> bool {
        matches!(self, ErrorKind::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<&VmError> for ErrorKind {
    fn from(err: &VmError) -> Self {
        match err {
            VmError::AltStackUnderflow => ErrorKind::AltStackUnderflow,
            VmError::BadValue => ErrorKind::BadValue,
            VmError::WrongContext => ErrorKind::WrongContext,
            VmError::DataStackUnderflow => ErrorKind::DataStackUnderflow,
            VmError::DisallowedOpcode(_) => ErrorKind::DisallowedOpcode,
            VmError::DivideByZero => ErrorKind::DivideByZero,
            VmError::FalseResult => ErrorKind::FalseResult,
            VmError::LongProgram => ErrorKind::LongProgram,
            VmError::RangeError => ErrorKind::RangeError,
            VmError::ReturnExecuted => ErrorKind::ReturnExecuted,
            VmError::RunLimitExceeded => ErrorKind::RunLimitExceeded,
            VmError::ShortProgram => ErrorKind::ShortProgram,
            VmError::UnrecognizedToken(_) => ErrorKind::UnrecognizedToken,
            VmError::UnexpectedError(_) => ErrorKind::UnexpectedError,
            VmError::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            VmError::VerifyFailed => ErrorKind::VerifyFailed,
            VmError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
        }
    }
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::Internal(_) => ErrorKind::Internal,
            ValidationError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            ValidationError::OrphanInput(_) => ErrorKind::OrphanInput,
            ValidationError::TxVersion { .. } => ErrorKind::TxVersion,
            ValidationError::WrongTransactionSize { .. } => ErrorKind::WrongTransactionSize,
            ValidationError::BadTimeRange { .. } => ErrorKind::BadTimeRange,
            ValidationError::NotStandardTx => ErrorKind::NotStandardTx,
            ValidationError::WrongCoinbaseTransaction(_) => ErrorKind::WrongCoinbaseTransaction,
            ValidationError::WrongCoinbaseAsset(_) => ErrorKind::WrongCoinbaseAsset,
            ValidationError::CoinbaseArbitraryOversize { .. } => {
                ErrorKind::CoinbaseArbitraryOversize
            }
            ValidationError::EmptyResults => ErrorKind::EmptyResults,
            ValidationError::MismatchedAssetId { .. } => ErrorKind::MismatchedAssetId,
            ValidationError::MismatchedPosition { .. } => ErrorKind::MismatchedPosition,
            ValidationError::MismatchedReference => ErrorKind::MismatchedReference,
            ValidationError::MismatchedValue { .. } => ErrorKind::MismatchedValue,
            ValidationError::MissingField(_) => ErrorKind::MissingField,
            ValidationError::NoSource(_) => ErrorKind::NoSource,
            ValidationError::Overflow => ErrorKind::Overflow,
            ValidationError::Position(_) => ErrorKind::Position,
            ValidationError::Unbalanced { .. } => ErrorKind::Unbalanced,
            ValidationError::OverGasCredit { .. } => ErrorKind::OverGasCredit,
            ValidationError::GasCalculate => ErrorKind::GasCalculate,
            ValidationError::MalformedReference(_) => ErrorKind::MalformedReference,
            ValidationError::MalformedEncoding(_) => ErrorKind::MalformedEncoding,
            ValidationError::Vm(err) => ErrorKind::from(err),
        }
    }

    pub fn code(&self) -> u16 {
        self.kind().code()
    }

    pub fn category(&self) -> Category {
        self.kind().category()
    }

    pub fn is_temporary(&self) -> bool {
        self.kind().is_temporary()
    }

    pub fn is_internal(&self) -> bool {
        self.kind().is_internal()
    }
}
