// Login credentials and the vendor's credential cipher
//
// The login endpoint only accepts the ID and password encrypted with a
// passphrase hard-coded in the vendor's web client. The envelope is the
// OpenSSL "Salted__" format (EVP_BytesToKey/MD5 + AES-256-CBC + PKCS#7,
// base64-encoded). Anyone holding the passphrase can decrypt it, so this is
// protocol compliance, not confidentiality.

use std::fmt;

use aes::Aes256;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;

/// Passphrase shared with the vendor's servers.
const VENDOR_PASSPHRASE: &[u8] = b"hTsEcret";

const SALT_MAGIC: &[u8] = b"Salted__";
const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Account credentials supplied at construction.
///
/// The secret never appears in `Debug` output or logs.
#[derive(Clone)]
pub struct Credentials {
    id: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(id: impl Into<String>, password: SecretString) -> Self {
        Self {
            id: id.into(),
            password,
        }
    }

    /// The account identifier (not secret, but only sent encrypted).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("password", &"****")
            .finish()
    }
}

/// Encrypts credentials the way the vendor's login endpoint expects.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialCodec;

impl CredentialCodec {
    /// Encrypt `secret` into the base64 `Salted__` envelope.
    ///
    /// Deterministic: the salt is derived from the passphrase and input,
    /// so equal inputs produce equal cipher-text. The vendor's web client
    /// draws a random salt instead. The server reads the salt from the
    /// envelope header, so it accepts either.
    pub fn encrypt(&self, secret: &str) -> String {
        let salt = derive_salt(secret.as_bytes());
        let (key, iv) = evp_bytes_to_key(VENDOR_PASSPHRASE, &salt);

        let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(secret.as_bytes());

        let mut envelope = Vec::with_capacity(SALT_MAGIC.len() + SALT_LEN + ciphertext.len());
        envelope.extend_from_slice(SALT_MAGIC);
        envelope.extend_from_slice(&salt);
        envelope.extend_from_slice(&ciphertext);
        STANDARD.encode(envelope)
    }

    /// Encrypt the identifier and password of `credentials`.
    pub fn encrypt_credentials(&self, credentials: &Credentials) -> (String, String) {
        (
            self.encrypt(credentials.id()),
            self.encrypt(credentials.password().expose_secret()),
        )
    }
}

fn derive_salt(plaintext: &[u8]) -> [u8; SALT_LEN] {
    let digest = Md5::new()
        .chain_update(VENDOR_PASSPHRASE)
        .chain_update(plaintext)
        .finalize();
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&digest[..SALT_LEN]);
    salt
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single iteration.
fn evp_bytes_to_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let mut material = Vec::with_capacity(KEY_LEN + IV_LEN + 16);
    let mut previous: Vec<u8> = Vec::new();
    while material.len() < KEY_LEN + IV_LEN {
        let block = Md5::new()
            .chain_update(&previous)
            .chain_update(passphrase)
            .chain_update(salt)
            .finalize();
        material.extend_from_slice(&block);
        previous = block.to_vec();
    }

    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&material[..KEY_LEN]);
    iv.copy_from_slice(&material[KEY_LEN..KEY_LEN + IV_LEN]);
    (key, iv)
}
