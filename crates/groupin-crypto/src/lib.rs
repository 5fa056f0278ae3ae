/// GroupIn Crypto Library
///
/// Every client holds the same static AES-256-GCM key. There is no key
/// exchange or rotation: confidentiality is only as strong as the
/// distribution of that key.
///
/// Selective messages are encrypted once per recipient and tagged with the
/// recipient's numeric identity. Tags travel in clear text; every client
/// receives every message and decides locally whether to decrypt it.
pub mod encrypt;
pub mod keys;
pub mod selective;

pub use encrypt::CipherError;
pub use selective::{Reading, decrypt_for, encrypt_for};
