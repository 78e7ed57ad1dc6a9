//! Permission matrix: module × action → allowed.
//!
//! A role stores, per [`Module`], a 4-character flag string in the fixed
//! order CREATE, READ, UPDATE, DELETE (e.g. `"1010"`). Lookups are
//! fail-closed: a missing or malformed string denies every action.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use jktdocs_core::DomainError;

/// Number of flags in a permission string.
pub const FLAG_COUNT: usize = 4;

const PERMISSION_MESSAGE: &str = "Each permission value must be a 4-character string consisting of only 0 and 1, and keys must be valid module types.";

/// Protected resource category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Module {
    User,
    Role,
    Document,
}

impl Module {
    pub const ALL: [Module; 3] = [Module::User, Module::Role, Module::Document];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::User => "USER",
            Module::Role => "ROLE",
            Module::Document => "DOCUMENT",
        }
    }
}

impl core::fmt::Display for Module {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Module::User),
            "ROLE" => Ok(Module::Role),
            "DOCUMENT" => Ok(Module::Document),
            _ => Err(DomainError::validation(format!("unknown module '{s}'"))),
        }
    }
}

/// Operation kind checked against a module's flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    /// Position of this action's flag inside a permission string.
    pub const fn index(self) -> usize {
        match self {
            Action::Create => 0,
            Action::Read => 1,
            Action::Update => 2,
            Action::Delete => 3,
        }
    }

    /// Derive the action from an HTTP-style method name.
    ///
    /// Methods outside the CRUD mapping yield `None`.
    pub fn from_method(method: &str) -> Option<Action> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(Action::Read),
            "POST" => Some(Action::Create),
            "PUT" | "PATCH" => Some(Action::Update),
            "DELETE" => Some(Action::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "CREATE",
            Action::Read => "READ",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Action::Create),
            "READ" => Ok(Action::Read),
            "UPDATE" => Ok(Action::Update),
            "DELETE" => Ok(Action::Delete),
            _ => Err(DomainError::validation(format!("unknown action '{s}'"))),
        }
    }
}

/// A validated set of four flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PermissionFlags([bool; FLAG_COUNT]);

impl PermissionFlags {
    pub const NONE: PermissionFlags = PermissionFlags([false; FLAG_COUNT]);
    pub const ALL: PermissionFlags = PermissionFlags([true; FLAG_COUNT]);

    /// Parse a flag string strictly (`^[01]{4}$`).
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let bytes = raw.as_bytes();
        if bytes.len() != FLAG_COUNT {
            return Err(DomainError::validation(PERMISSION_MESSAGE));
        }
        let mut flags = [false; FLAG_COUNT];
        for (slot, byte) in flags.iter_mut().zip(bytes) {
            *slot = match byte {
                b'0' => false,
                b'1' => true,
                _ => return Err(DomainError::validation(PERMISSION_MESSAGE)),
            };
        }
        Ok(Self(flags))
    }

    /// Lenient parse used on the decision path: anything malformed is "all denied".
    pub fn parse_or_deny(raw: Option<&str>) -> Self {
        raw.and_then(|r| Self::parse(r).ok()).unwrap_or(Self::NONE)
    }

    pub fn allows(&self, action: Action) -> bool {
        self.0[action.index()]
    }

    pub fn as_string(&self) -> String {
        self.0.iter().map(|f| if *f { '1' } else { '0' }).collect()
    }
}

impl core::fmt::Display for PermissionFlags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// Per-module permission strings of a role, as stored.
///
/// The raw strings are kept untouched so that a malformed stored value is
/// visible for what it is; [`PermissionMap::allows`] decides fail-closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct PermissionMap(BTreeMap<Module, String>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every module granted every action.
    pub fn full() -> Self {
        Module::ALL
            .iter()
            .map(|m| (*m, PermissionFlags::ALL.as_string()))
            .collect()
    }

    /// Build a map from client input, rejecting unknown modules and malformed flags.
    pub fn parse_strict(raw: &BTreeMap<String, String>) -> Result<Self, DomainError> {
        let mut out = BTreeMap::new();
        for (key, value) in raw {
            let module = Module::from_str(key)
                .ok()
                .filter(|m| m.as_str() == key)
                .ok_or_else(|| DomainError::validation(PERMISSION_MESSAGE))?;
            let flags = PermissionFlags::parse(value)?;
            out.insert(module, flags.as_string());
        }
        Ok(Self(out))
    }

    pub fn with(mut self, module: Module, raw: impl Into<String>) -> Self {
        self.0.insert(module, raw.into());
        self
    }

    pub fn raw(&self, module: Module) -> Option<&str> {
        self.0.get(&module).map(String::as_str)
    }

    /// Effective flags for a module (`0000` when absent or malformed).
    pub fn flags(&self, module: Module) -> PermissionFlags {
        PermissionFlags::parse_or_deny(self.raw(module))
    }

    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.flags(module).allows(action)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Module, &str)> {
        self.0.iter().map(|(m, s)| (*m, s.as_str()))
    }
}

impl FromIterator<(Module, String)> for PermissionMap {
    fn from_iter<T: IntoIterator<Item = (Module, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Stored maps may carry modules this build does not know; those are dropped.
impl From<BTreeMap<String, String>> for PermissionMap {
    fn from(value: BTreeMap<String, String>) -> Self {
        value
            .into_iter()
            .filter_map(|(k, v)| {
                let module = Module::from_str(&k).ok().filter(|m| m.as_str() == k)?;
                Some((module, v))
            })
            .collect()
    }
}

impl Serialize for PermissionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
