//! Named collection of compiled dictionaries
//!
//! Lets one program carry several dictionaries (say, one per message
//! catalogue) and pick between them by name. The first registered
//! dictionary is the default and is what an empty name resolves to.

use tracing::debug;

use crate::codec::Codec;
use crate::error::FbpError;
use crate::DictionaryBundle;

struct Registration {
    name: String,
    bundle: DictionaryBundle,
    codec: Codec,
}

#[derive(Default)]
pub struct DictionaryRegistry {
    registrations: Vec<Registration>,
}

impl DictionaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dictionary, replacing any existing one with the same name.
    pub fn register(&mut self, name: &str, bundle: DictionaryBundle) -> Result<(), FbpError> {
        let codec = Codec::new(&bundle)?;
        let registration = Registration {
            name: name.to_string(),
            bundle,
            codec,
        };

        match self.registrations.iter_mut().find(|r| r.name == name) {
            Some(existing) => *existing = registration,
            None => self.registrations.push(registration),
        }
        debug!(name, registered = self.registrations.len(), "dictionary registered");
        Ok(())
    }

    /// Remove a dictionary. Later registrations move up, so removing the
    /// default promotes the next one.
    pub fn unregister(&mut self, name: &str) -> Option<DictionaryBundle> {
        let pos = self.registrations.iter().position(|r| r.name == name)?;
        Some(self.registrations.remove(pos).bundle)
    }

    fn find(&self, name: &str) -> Result<&Registration, FbpError> {
        let found = if name.is_empty() {
            self.registrations.first()
        } else {
            self.registrations.iter().find(|r| r.name == name)
        };
        found.ok_or_else(|| FbpError::UnknownDictionary(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<&DictionaryBundle, FbpError> {
        self.find(name).map(|r| &r.bundle)
    }

    pub fn codec(&self, name: &str) -> Result<&Codec, FbpError> {
        self.find(name).map(|r| &r.codec)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registrations.iter().map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
