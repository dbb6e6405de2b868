//! Key-value persistence with file locking.
//!
//! Each key is stored as one JSON document. Plain reads never fail: missing,
//! unreadable or corrupt values are logged and replaced by defaults so the
//! front end keeps working. Read-modify-write operations load strictly and
//! refuse to write over a document they could not read. Writes are atomic
//! (temp file + rename) and return their error to the caller.

use crate::challenge;
use crate::{
    ChallengeStatus, DayCounters, Error, ReductionPlan, Result, SubscribedChallenge, UserProfile,
};
use chrono::{DateTime, NaiveDate, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const CIGARETTES_KEY: &str = "cigarettes";
pub const PROFILE_KEY: &str = "profile";
pub const CHALLENGES_KEY: &str = "subscribed_challenges";
pub const LAST_CIGARETTE_KEY: &str = "last_cigarette_time";
pub const PLAN_KEY: &str = "reduction_plan";

/// Raw string store the domain repository is built on
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Volatile store, used in tests and as a last-resort fallback
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        let _ = file.unlock();
        read?;

        tracing::debug!("Read key '{}' from {:?}", key, path);
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        // Temp file in the same directory so the rename stays atomic
        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved key '{}' to {:?}", key, path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Domain repository over a [`KeyValueStore`]
pub struct Storage<S: KeyValueStore> {
    store: S,
}

impl Storage<JsonFileStore> {
    /// File-backed storage rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileStore::new(dir))
    }
}

impl Storage<MemoryStore> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Load and decode a key, falling back to `T::default()` on any failure
    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!("Unable to read '{}': {}. Using defaults.", key, e);
                return T::default();
            }
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse '{}': {}. Using defaults.", key, e);
                T::default()
            }
        }
    }

    /// Load and decode a key for an update; only a missing key yields the default
    fn load_for_update<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let Some(raw) = self.store.get(key).map_err(|e| {
            tracing::warn!("Unable to read '{}' for update: {}", key, e);
            e
        })?
        else {
            return Ok(T::default());
        };

        serde_json::from_str::<T>(&raw).map_err(|e| {
            tracing::warn!("Refusing to overwrite unreadable '{}': {}", key, e);
            Error::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn save_value<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        // Compact JSON; documents are small and rewritten often
        let contents = serde_json::to_string(value)?;
        self.store.set(key, &contents).map_err(|e| {
            tracing::warn!("Failed to save '{}': {}", key, e);
            e
        })
    }

    // ------------------------------------------------------------------------
    // Day counters
    // ------------------------------------------------------------------------

    /// All stored days, sorted by date
    pub fn get_all_data(&self) -> Vec<DayCounters> {
        let mut days: Vec<DayCounters> = self.load_or_default(CIGARETTES_KEY);
        days.sort_by_key(|d| d.date);
        days
    }

    /// The record for `date`, or a zeroed one if it was never touched
    pub fn get_day_data(&self, date: NaiveDate) -> DayCounters {
        self.get_all_data()
            .into_iter()
            .find(|d| d.date == date)
            .unwrap_or_else(|| DayCounters::new(date))
    }

    /// Upsert keyed by date
    pub fn save_day_data(&mut self, day: &DayCounters) -> Result<()> {
        let mut days: Vec<DayCounters> = self.load_for_update(CIGARETTES_KEY)?;
        match days.iter_mut().find(|d| d.date == day.date) {
            Some(existing) => *existing = day.clone(),
            None => days.push(day.clone()),
        }
        days.sort_by_key(|d| d.date);
        self.save_value(CIGARETTES_KEY, &days)
    }

    /// Remove a day. Returns whether a record existed.
    pub fn delete_day(&mut self, date: NaiveDate) -> Result<bool> {
        let mut days: Vec<DayCounters> = self.load_for_update(CIGARETTES_KEY)?;
        let before = days.len();
        days.retain(|d| d.date != date);
        if days.len() == before {
            return Ok(false);
        }
        self.save_value(CIGARETTES_KEY, &days)?;
        tracing::info!("Deleted day {}", date);
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------------

    pub fn get_profile(&self) -> UserProfile {
        self.load_or_default(PROFILE_KEY)
    }

    /// Strict read for callers that modify and save the profile
    pub fn get_profile_for_update(&self) -> Result<UserProfile> {
        self.load_for_update(PROFILE_KEY)
    }

    pub fn save_profile(&mut self, profile: &UserProfile) -> Result<()> {
        self.save_value(PROFILE_KEY, profile)
    }

    // ------------------------------------------------------------------------
    // Challenges
    // ------------------------------------------------------------------------

    pub fn get_subscribed_challenges(&self) -> Vec<SubscribedChallenge> {
        self.load_or_default(CHALLENGES_KEY)
    }

    pub fn save_subscribed_challenges(&mut self, subs: &[SubscribedChallenge]) -> Result<()> {
        self.save_value(CHALLENGES_KEY, subs)
    }

    /// Subscribe and persist; nothing is written when the subscription is rejected
    pub fn subscribe_to_challenge(
        &mut self,
        id: &str,
        today: NaiveDate,
    ) -> Result<SubscribedChallenge> {
        let mut subs: Vec<SubscribedChallenge> = self.load_for_update(CHALLENGES_KEY)?;
        let entry = challenge::subscribe(&mut subs, id, today)?;
        self.save_subscribed_challenges(&subs)?;
        Ok(entry)
    }

    pub fn unsubscribe_from_challenge(&mut self, id: &str) -> Result<bool> {
        let mut subs: Vec<SubscribedChallenge> = self.load_for_update(CHALLENGES_KEY)?;
        let removed = challenge::unsubscribe(&mut subs, id);
        if removed {
            self.save_subscribed_challenges(&subs)?;
        }
        Ok(removed)
    }

    /// Returns whether a matching subscription was found
    pub fn update_challenge_status(&mut self, id: &str, status: ChallengeStatus) -> Result<bool> {
        let mut subs: Vec<SubscribedChallenge> = self.load_for_update(CHALLENGES_KEY)?;
        let Some(entry) = subs.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        entry.status = status;
        self.save_subscribed_challenges(&subs)?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Last cigarette
    // ------------------------------------------------------------------------

    pub fn get_last_cigarette_time(&self) -> Option<DateTime<Utc>> {
        self.load_or_default(LAST_CIGARETTE_KEY)
    }

    pub fn save_last_cigarette_time(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.save_value(LAST_CIGARETTE_KEY, &at)
    }

    // ------------------------------------------------------------------------
    // Reduction plan
    // ------------------------------------------------------------------------

    pub fn get_plan(&self) -> Option<ReductionPlan> {
        self.load_or_default(PLAN_KEY)
    }

    /// Replace the stored plan wholesale
    pub fn save_plan(&mut self, plan: &ReductionPlan) -> Result<()> {
        self.save_value(PLAN_KEY, plan)
    }

    pub fn clear_plan(&mut self) -> Result<()> {
        self.store.remove(PLAN_KEY)
    }
}
