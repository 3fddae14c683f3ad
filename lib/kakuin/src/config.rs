//!
//! Property based configuration of signers and verifiers
//!
//! Properties are read from TOML documents. Nested tables are flattened into dotted keys,
//! so `[rs.security]` with `"keystore.file" = "alice.pem"` is equivalent to `"rs.security.keystore.file" = "alice.pem"`.
//!

use crate::{
    algorithm::{DigestAlgorithm, SignatureAlgorithm, SigningAlgorithm},
    crypto::{parse, PrivateKey, PublicKey},
    key::KeyStore,
    signer::MessageSigner,
    verifier::MessageVerifier,
    REQUEST_TARGET,
};
use miette::Diagnostic;
use serde::{de::DeserializeOwned, Deserialize};
use std::{
    borrow::Cow,
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use thiserror::Error;
use toml::Value;
use tracing::debug;

/// Key ID for outgoing signatures
pub const KEY_ID: &str = "rs.security.http.signature.key.id";

/// Signature algorithm
pub const SIGNATURE_ALGORITHM: &str = "rs.security.signature.algorithm";

/// Body digest algorithm
pub const DIGEST_ALGORITHM: &str = "rs.security.http.signature.digest.algorithm";

/// Components to sign on outgoing messages
pub const OUT_HEADERS: &str = "rs.security.http.signature.out.headers";

/// Components required to be signed on incoming messages
pub const IN_HEADERS: &str = "rs.security.http.signature.in.headers";

/// Properties file used for both directions
pub const SIGNATURE_PROPERTIES: &str = "rs.security.signature.properties";

/// Properties file used for outgoing messages
pub const SIGNATURE_OUT_PROPERTIES: &str = "rs.security.signature.out.properties";

/// Properties file used for incoming messages
pub const SIGNATURE_IN_PROPERTIES: &str = "rs.security.signature.in.properties";

/// PEM file holding the key material
pub const KEYSTORE_FILE: &str = "rs.security.keystore.file";

/// Key ID of the keystore entry
pub const KEYSTORE_ALIAS: &str = "rs.security.keystore.alias";

/// Password of the keystore
pub const KEYSTORE_PASSWORD: &str = "rs.security.keystore.password";

/// Password of the private key
pub const KEY_PASSWORD: &str = "rs.security.key.password";

/// Configuration error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Value of a property is invalid
    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue {
        /// Property key
        key: String,

        /// Reason the value was rejected
        reason: String,
    },

    /// File couldn't be read
    #[error("Failed to read `{}`", path.display())]
    Io {
        /// Path of the file
        path: PathBuf,

        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Key material couldn't be parsed
    #[error(transparent)]
    Key(#[from] parse::Error),

    /// Property needed to locate or identify the key isn't set
    #[error("Missing key material (`{0}` isn't set)")]
    MissingKeyMaterial(&'static str),

    /// Malformed TOML document
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// List of components, either as an array or as a space/comma separated string
#[derive(Deserialize)]
#[serde(untagged)]
enum HeaderList {
    List(Vec<String>),
    Joined(String),
}

impl From<HeaderList> for Vec<String> {
    fn from(value: HeaderList) -> Self {
        let components = match value {
            HeaderList::List(list) => list,
            HeaderList::Joined(joined) => joined
                .split(|ch: char| ch == ',' || ch.is_whitespace())
                .map(str::to_string)
                .collect(),
        };

        components
            .into_iter()
            .map(|component| component.trim().to_lowercase())
            .filter(|component| !component.is_empty())
            .collect()
    }
}

/// Flattened set of properties
#[derive(Clone, Debug, Default)]
pub struct Properties {
    base_dir: PathBuf,
    values: HashMap<String, Value>,
}

impl Properties {
    /// Load properties from a TOML file
    ///
    /// Relative paths inside the file are resolved against the directory of the file
    pub fn load<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading properties");

        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Self::from_toml_str(&content, base_dir)
    }

    /// Parse properties from a TOML document
    ///
    /// Relative paths are resolved against `base_dir`
    pub fn from_toml_str<P>(content: &str, base_dir: P) -> Result<Self, Error>
    where
        P: Into<PathBuf>,
    {
        let table: toml::Table = content.parse()?;
        let mut values = HashMap::new();
        flatten(None, table, &mut values);

        Ok(Self {
            base_dir: base_dir.into(),
            values,
        })
    }

    /// Set a property, replacing the previous value
    pub fn set<V>(&mut self, key: impl Into<String>, value: V)
    where
        V: Into<Value>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Deserialise the value of a property
    pub fn get<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        self.values
            .get(key)
            .map(|value| {
                value.clone().try_into().map_err(|err: toml::de::Error| {
                    Error::InvalidValue {
                        key: key.to_string(),
                        reason: err.message().to_string(),
                    }
                })
            })
            .transpose()
    }

    /// Value of a string property
    pub fn get_str(&self, key: &str) -> Result<Option<&str>, Error> {
        match self.values.get(key) {
            Some(Value::String(value)) => Ok(Some(value)),
            Some(other) => Err(Error::InvalidValue {
                key: key.to_string(),
                reason: format!("expected a string, found {}", other.type_str()),
            }),
            None => Ok(None),
        }
    }

    /// Value of a path property, resolved against the base directory
    pub fn get_path(&self, key: &str) -> Result<Option<PathBuf>, Error> {
        Ok(self.get_str(key)?.map(|path| self.base_dir.join(path)))
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: FromStr,
    {
        self.get_str(key)?
            .map(|value| {
                T::from_str(value.trim()).map_err(|_| Error::InvalidValue {
                    key: key.to_string(),
                    reason: format!("unsupported value `{value}`"),
                })
            })
            .transpose()
    }

    /// Layer these properties over the properties file referenced for one direction
    ///
    /// The per-direction file wins over the shared one. Properties set here win over both.
    fn layered(&self, direction_key: &str) -> Result<Cow<'_, Self>, Error> {
        let path = match self.get_path(direction_key)? {
            Some(path) => path,
            None => match self.get_path(SIGNATURE_PROPERTIES)? {
                Some(path) => path,
                None => return Ok(Cow::Borrowed(self)),
            },
        };

        let mut layered = Self::load(path)?;
        for (key, value) in &self.values {
            let value = match value {
                Value::String(path) if key == KEYSTORE_FILE => {
                    Value::String(self.base_dir.join(path).to_string_lossy().into_owned())
                }
                value => value.clone(),
            };

            layered.values.insert(key.clone(), value);
        }

        Ok(Cow::Owned(layered))
    }

    fn key_id(&self) -> Result<String, Error> {
        let key_id = match self.get_str(KEY_ID)? {
            Some(key_id) => key_id,
            None => self
                .get_str(KEYSTORE_ALIAS)?
                .ok_or(Error::MissingKeyMaterial(KEYSTORE_ALIAS))?,
        };

        Ok(key_id.to_string())
    }

    fn password(&self) -> Result<Option<&str>, Error> {
        match self.get_str(KEY_PASSWORD)? {
            Some(password) => Ok(Some(password)),
            None => self.get_str(KEYSTORE_PASSWORD),
        }
    }

    fn key_material(&self) -> Result<String, Error> {
        let path = self
            .get_path(KEYSTORE_FILE)?
            .ok_or(Error::MissingKeyMaterial(KEYSTORE_FILE))?;

        fs::read_to_string(&path).map_err(|source| Error::Io { path, source })
    }

    fn algorithm(&self) -> Result<SigningAlgorithm, Error> {
        let signature: SignatureAlgorithm =
            self.parsed(SIGNATURE_ALGORITHM)?.unwrap_or_default();
        let digest: DigestAlgorithm = self.parsed(DIGEST_ALGORITHM)?.unwrap_or_default();

        Ok(SigningAlgorithm::new(signature, digest))
    }

    fn components(&self, key: &str) -> Result<Option<Vec<String>>, Error> {
        Ok(self.get::<HeaderList>(key)?.map(Vec::from))
    }
}

fn flatten(prefix: Option<&str>, table: toml::Table, values: &mut HashMap<String, Value>) {
    for (key, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };

        match value {
            Value::Table(table) => flatten(Some(&key), table, values),
            value => {
                values.insert(key, value);
            }
        }
    }
}

/// Build a signer for outgoing messages
pub fn signer(properties: &Properties) -> Result<MessageSigner<KeyStore<Arc<PrivateKey>>>, Error> {
    let properties = properties.layered(SIGNATURE_OUT_PROPERTIES)?;

    let pem = properties.key_material()?;
    let private_key = match properties.password()? {
        Some(password) => parse::encrypted_private_key(&pem, password)?,
        None => parse::private_key(&pem)?,
    };

    let key_id = properties.key_id()?;
    let key_store = KeyStore::new().with(key_id.clone(), Arc::new(private_key));

    Ok(MessageSigner::builder()
        .key_id(key_id)
        .key_resolver(key_store)
        .algorithm(properties.algorithm()?)
        .components(properties.components(OUT_HEADERS)?)
        .build())
}

/// Build a verifier for incoming messages
///
/// The verifier only accepts the configured signature algorithm and the configured key ID
pub fn verifier(properties: &Properties) -> Result<MessageVerifier<KeyStore<PublicKey>>, Error> {
    let properties = properties.layered(SIGNATURE_IN_PROPERTIES)?;

    let pem = properties.key_material()?;
    let public_key = parse::verifying_key(&pem, properties.password()?)?;
    let key_store = KeyStore::new().with(properties.key_id()?, public_key);

    let algorithm = properties.algorithm()?;
    let required_components = properties
        .components(IN_HEADERS)?
        .unwrap_or_else(|| vec![REQUEST_TARGET.to_string()]);

    Ok(MessageVerifier::builder()
        .key_resolver(key_store)
        .required_components(required_components)
        .expected_algorithm(Some(algorithm.signature))
        .digest_algorithm(algorithm.digest)
        .build())
}
