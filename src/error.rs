use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DimsError {
    /// Rank mismatch, unknown or duplicate dims, misaligned sizes.
    #[error("Dimension error: {0}")]
    Dimension(String),
    /// Incompatible or unsupported units.
    #[error("Units error: {0}")]
    Units(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Index out of bounds: {index} for dimension of size {size} at axis {axis}")]
    IndexOutOfBounds { index: isize, size: usize, axis: usize },
    #[error("Reshape error: cannot reshape array of size {size} into shape {shape:?}")]
    Reshape { size: usize, shape: Vec<usize> },
}

impl DimsError {
    pub fn dimension(msg: impl Into<String>) -> Self {
        Self::Dimension(msg.into())
    }

    pub fn units(msg: impl Into<String>) -> Self {
        Self::Units(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::NotImplemented(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn index_out_of_bounds(index: isize, size: usize, axis: usize) -> Self {
        Self::IndexOutOfBounds { index, size, axis }
    }

    pub fn reshape_error(size: usize, shape: Vec<usize>) -> Self {
        Self::Reshape { size, shape }
    }

    /// Returns `true` for the dimension-error category.
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, Self::Dimension(_))
    }

    /// Returns `true` for the units-error category.
    pub fn is_units_error(&self) -> bool {
        matches!(self, Self::Units(_))
    }
}

pub type Result<T> = std::result::Result<T, DimsError>;
