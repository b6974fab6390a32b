use thiserror::Error;

/// All errors that can occur in envbox.
#[derive(Debug, Error)]
pub enum EnvBoxError {
    // --- Configuration errors ---
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // --- Vault errors ---
    #[error("Secret '{0}' already exists (remove it first to change it)")]
    DuplicateName(String),

    #[error("Secret '{0}' not found")]
    NotFound(String),

    #[error("Invalid record payload: {0}")]
    InvalidRecord(String),

    #[error("Invalid variable name '{0}'")]
    InvalidVariableName(String),

    // --- Credential helper errors ---
    #[error("No credential helper available")]
    HelperUnavailable,

    #[error("Credential helper error: {0}")]
    CredentialHelper(String),

    // --- Prompt errors ---
    #[error("Interrupted")]
    InterruptedPrompt,

    #[error("Prompt failed: {0}")]
    PromptFailed(#[source] std::io::Error),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Run errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Child process exited with code {0}")]
    ChildProcessFailed(i32),

    #[error("No command specified — use `envbox run -e <name> -- <command>`")]
    NoCommandSpecified,
}

/// Convenience type alias for envbox results.
pub type Result<T> = std::result::Result<T, EnvBoxError>;
