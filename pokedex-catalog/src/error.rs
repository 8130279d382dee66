use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
	#[error("Invalid record: {0}")]
	InvalidRecord(String),
	#[error("Field is not editable: {0}")]
	InvalidField(String),
	#[error("Invalid value for {field}: {reason}")]
	InvalidValue { field: String, reason: String },
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),
	#[error("Storage corruption: {0}")]
	Corruption(String),
}

impl CatalogError {
	pub fn code(&self) -> &str {
		match self {
			Self::InvalidRecord(_) => "CATALOG_INVALID_RECORD",
			Self::InvalidField(_) => "CATALOG_INVALID_FIELD",
			Self::InvalidValue { .. } => "CATALOG_INVALID_VALUE",
			Self::Io(_) => "CATALOG_IO",
			Self::Csv(_) => "CATALOG_CSV",
			Self::Corruption(_) => "CATALOG_CORRUPT",
		}
	}

	/// True for failures caused by caller input rather than storage.
	pub fn is_user_error(&self) -> bool {
		matches!(
			self,
			Self::InvalidRecord(_) | Self::InvalidField(_) | Self::InvalidValue { .. }
		)
	}
}
