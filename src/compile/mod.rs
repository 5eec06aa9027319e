//! C to 8051 assembly compilation, used to compare C submissions at the
//! instruction level.

mod keil;

pub use keil::{COMPILE_TIMEOUT, KeilC51, find_installation};

use std::path::Path;

/// Failure of one compilation. Never fatal for the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// No usable compiler installation
    NotInstalled(String),

    /// Filesystem or process-spawn failure
    Io { context: String, message: String },

    /// Compiler ran and reported failure
    Failed { status: String, output: String },

    /// Compiler did not finish in time
    Timeout { seconds: u64 },

    /// Compiler succeeded but produced no listing
    MissingOutput(String),
}

impl CompileError {
    pub(crate) fn io(context: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInstalled(msg) => write!(f, "{}", msg),
            Self::Io { context, message } => write!(f, "{}: {}", context, message),
            Self::Failed { status, output } => {
                write!(f, "Compilation failed ({}): {}", status, output.trim())
            }
            Self::Timeout { seconds } => write!(f, "Compilation timed out after {}s", seconds),
            Self::MissingOutput(path) => {
                write!(f, "Assembly file not found after compilation: {}", path)
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Turns a C source file into assembly text.
pub trait AsmCompiler: Send + Sync {
    fn name(&self) -> &str;

    fn compile(&self, c_file: &Path) -> Result<String, CompileError>;
}
