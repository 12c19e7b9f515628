//! Encryption of credential secrets at rest

mod cipher;

pub use cipher::SecretCipher;
