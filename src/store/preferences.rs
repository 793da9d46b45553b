use anyhow::Result;

use crate::store::schema::AUTO_READ_KEY;
use crate::store::{BlobStore, load_or_default, save_json};

/// Learner preferences that outlive a single study session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Preferences {
    auto_read: bool,
}

impl Preferences {
    pub fn load<S: BlobStore + ?Sized>(store: &S) -> Self {
        Self {
            auto_read: load_or_default(store, AUTO_READ_KEY),
        }
    }

    pub fn auto_read(&self) -> bool {
        self.auto_read
    }

    pub fn set_auto_read<S: BlobStore + ?Sized>(&mut self, store: &S, enabled: bool) -> Result<()> {
        self.auto_read = enabled;
        save_json(store, AUTO_READ_KEY, &enabled)
    }

    pub fn toggle_auto_read<S: BlobStore + ?Sized>(&mut self, store: &S) -> Result<bool> {
        let enabled = !self.auto_read;
        self.set_auto_read(store, enabled)?;
        Ok(enabled)
    }
}
