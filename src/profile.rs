use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::SchemaViolation;
use crate::{ProfileError, Result};

const LOG_PREFIX: &str = "[profile]";

pub const UID_MEMBER: &str = "uid";
const NAME_MEMBER: &str = "name";
const DESCRIPTION_MEMBER: &str = "description";
const ETAG_MEMBER: &str = "etag";
const SETTINGS_MEMBER: &str = "settings";
const APPLIES_TO_MEMBER: &str = "applies-to";
const USERS_MEMBER: &str = "users";
const GROUPS_MEMBER: &str = "groups";

/// A parsed, immutable profile document.
///
/// Profiles are identified by their `uid` alone: two profiles with the same
/// uid are equal and hash alike even when the rest of their documents
/// differ, so a newer revision replaces an older one in a `HashSet`.
///
/// The only way to obtain a `Profile` is to load one, see
/// [`Profile::load_sync`], [`Profile::load`] and [`Profile::from_slice`].
/// Clones share the parsed document.
#[derive(Clone)]
pub struct Profile {
    uid: String,
    document: Arc<Value>,
}

impl Profile {
    /// Parse a complete profile document held in memory.
    ///
    /// This is the routine every stream loader ends in once the stream
    /// has been read to the end.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let document: Value = serde_json::from_slice(data)
            .map_err(|err| ProfileError::parse(data, err))?;
        let uid = extract_uid(&document)?.to_owned();

        log::debug!(
            "{} parsed profile {} from {} bytes",
            LOG_PREFIX,
            uid,
            data.len()
        );

        Ok(Self {
            uid,
            document: Arc::new(document),
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Stable hash of the uid, identical across processes and runs.
    pub fn identity(&self) -> u32 {
        crc32fast::hash(self.uid.as_bytes())
    }

    /// The whole parsed document, including members this crate
    /// doesn't interpret.
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn name(&self) -> Option<&str> {
        self.str_member(NAME_MEMBER)
    }

    pub fn description(&self) -> Option<&str> {
        self.str_member(DESCRIPTION_MEMBER)
    }

    /// Revision tag assigned by the profile producer
    pub fn etag(&self) -> Option<&str> {
        self.str_member(ETAG_MEMBER)
    }

    /// Settings stored under `namespace`, e.g. `org.gnome.gsettings`.
    pub fn settings(&self, namespace: &str) -> Option<&Value> {
        self.object_member(SETTINGS_MEMBER)?.get(namespace)
    }

    pub fn settings_namespaces(&self) -> impl Iterator<Item = &str> {
        self.object_member(SETTINGS_MEMBER)
            .into_iter()
            .flat_map(|settings| settings.keys().map(String::as_str))
    }

    pub fn applies_to_user(&self, user: &str) -> bool {
        self.applies_to(USERS_MEMBER, user)
    }

    pub fn applies_to_group(&self, group: &str) -> bool {
        self.applies_to(GROUPS_MEMBER, group)
    }

    /// Serialize the full document back to JSON.
    ///
    /// `pretty` selects an indented, human readable layout; otherwise the
    /// most compact encoding is produced. Either form loads back into an
    /// equal profile with a structurally equal document.
    pub fn to_data(&self, pretty: bool) -> Result<Vec<u8>> {
        let encoded = if pretty {
            serde_json::to_vec_pretty(self.document.as_ref())
        } else {
            serde_json::to_vec(self.document.as_ref())
        };
        let data = encoded.map_err(|err| {
            log::error!(
                "{} failed to serialize profile {}: {}",
                LOG_PREFIX,
                self.uid,
                err
            );
            ProfileError::Serialization(err)
        })?;

        log::debug!(
            "{} serialized profile {} into {} bytes",
            LOG_PREFIX,
            self.uid,
            data.len()
        );
        Ok(data)
    }

    fn str_member(&self, key: &str) -> Option<&str> {
        self.document.get(key)?.as_str()
    }

    fn object_member(&self, key: &str) -> Option<&Map<String, Value>> {
        self.document.get(key)?.as_object()
    }

    fn applies_to(&self, list: &str, entry: &str) -> bool {
        self.object_member(APPLIES_TO_MEMBER)
            .and_then(|applies_to| applies_to.get(list))
            .and_then(Value::as_array)
            .map(|entries| entries.iter().any(|e| e.as_str() == Some(entry)))
            .unwrap_or(false)
    }
}

fn extract_uid(document: &Value) -> std::result::Result<&str, SchemaViolation> {
    let members = document
        .as_object()
        .ok_or(SchemaViolation::NotAnObject)?;

    match members.get(UID_MEMBER) {
        None => Err(SchemaViolation::MissingUid),
        Some(Value::String(uid)) if uid.is_empty() => {
            Err(SchemaViolation::EmptyUid)
        }
        Some(Value::String(uid)) => Ok(uid),
        Some(_) => Err(SchemaViolation::UidNotString),
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for Profile {}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

impl Serialize for Profile {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        self.document.as_ref().serialize(serializer)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uid)
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("uid", &self.uid)
            .field("etag", &self.etag())
            .finish()
    }
}
