//! Several independent profiles side by side.

use craft_econ::Outcome;
use persistence::import_profile;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::IntentError;
use crate::intent::Intent;
use crate::profile::{Profile, ProfileId};

/// Profiles by id. Each owns its own catalog and graph; nothing is shared.
#[derive(Debug)]
pub struct ProfileBook {
    config: EngineConfig,
    rng: ChaCha8Rng,
    profiles: BTreeMap<ProfileId, Profile>,
}

impl ProfileBook {
    /// Empty book. Ids are reproducible when the config carries a seed.
    pub fn new(config: EngineConfig) -> Self {
        let seed = config.id_seed.unwrap_or_else(rand::random);
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            profiles: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn next_id(&mut self) -> ProfileId {
        loop {
            let id = ProfileId(self.rng.gen());
            if !self.profiles.contains_key(&id) {
                return id;
            }
        }
    }

    /// Create an empty profile with the configured global settings.
    pub fn create(&mut self, name: impl Into<String>) -> ProfileId {
        let id = self.next_id();
        let profile = Profile::new(id, name, &self.config);
        info!(profile = %id, name = %profile.name, "profile created");
        self.profiles.insert(id, profile);
        id
    }

    pub fn remove(&mut self, id: ProfileId) -> Option<Profile> {
        let removed = self.profiles.remove(&id);
        if removed.is_some() {
            info!(profile = %id, "profile removed");
        }
        removed
    }

    pub fn rename(&mut self, id: ProfileId, name: impl Into<String>) -> Result<(), IntentError> {
        let profile = self.get_mut(id)?;
        profile.name = name.into();
        Ok(())
    }

    /// Ids and names in id order.
    pub fn list(&self) -> Vec<(ProfileId, &str)> {
        self.profiles
            .values()
            .map(|p| (p.id, p.name.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, id: ProfileId) -> Result<&Profile, IntentError> {
        self.profiles.get(&id).ok_or(IntentError::UnknownProfile(id))
    }

    pub fn get_mut(&mut self, id: ProfileId) -> Result<&mut Profile, IntentError> {
        self.profiles.get_mut(&id).ok_or(IntentError::UnknownProfile(id))
    }

    /// Apply an intent to one profile.
    pub fn dispatch(&mut self, id: ProfileId, intent: Intent) -> Result<Outcome, IntentError> {
        self.get_mut(id)?.apply(intent)
    }

    pub fn export(&self, id: ProfileId) -> Result<String, IntentError> {
        self.get(id)?.export()
    }

    /// Add an exported profile as a new profile under a fresh id, named as
    /// in the document.
    pub fn import(&mut self, json: &str) -> Result<ProfileId, IntentError> {
        let document = import_profile(json)?;
        let name = document.name.clone();
        let (catalog, graph) = document.into_graph()?;
        let id = self.next_id();
        self.profiles.insert(
            id,
            Profile {
                id,
                name,
                catalog,
                graph,
            },
        );
        info!(profile = %id, "profile imported");
        Ok(id)
    }
}
