//! Tracker context: counter mutations plus challenge re-evaluation.
//!
//! A `Tracker` is created per invocation with an explicit `today`, and every
//! counter mutation is persisted and followed by evaluation of the active
//! challenges.

use crate::challenge;
use crate::plan;
use crate::storage::{KeyValueStore, Storage};
use crate::types::insert_label;
use crate::{DailyFeedback, DayCounters, Period, Result, SubscribedChallenge};
use chrono::{DateTime, NaiveDate, Utc};

pub struct Tracker<S: KeyValueStore> {
    storage: Storage<S>,
    today: NaiveDate,
}

impl<S: KeyValueStore> Tracker<S> {
    pub fn new(storage: Storage<S>, today: NaiveDate) -> Self {
        Self { storage, today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn storage(&self) -> &Storage<S> {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage<S> {
        &mut self.storage
    }

    pub fn today_counters(&self) -> DayCounters {
        self.storage.get_day_data(self.today)
    }

    /// Count one cigarette and re-evaluate challenges
    ///
    /// `at` becomes the last-cigarette time; `None` leaves it unchanged.
    /// Returns the updated day and the subscriptions whose status changed.
    pub fn add_cigarette(
        &mut self,
        period: Period,
        at: Option<DateTime<Utc>>,
    ) -> Result<(DayCounters, Vec<SubscribedChallenge>)> {
        let mut day = self.today_counters();
        day.increment(period);
        self.storage.save_day_data(&day)?;
        if let Some(at) = at {
            self.storage.save_last_cigarette_time(at)?;
        }
        tracing::info!("Added {} cigarette on {} (total {})", period, day.date, day.total());

        let changed = self.evaluate_for(&day)?;
        Ok((day, changed))
    }

    /// Take back one cigarette (clamped at zero) and re-evaluate challenges
    pub fn remove_cigarette(
        &mut self,
        period: Period,
    ) -> Result<(DayCounters, Vec<SubscribedChallenge>)> {
        let mut day = self.today_counters();
        day.decrement(period);
        self.storage.save_day_data(&day)?;
        tracing::info!("Removed {} cigarette on {} (total {})", period, day.date, day.total());

        let changed = self.evaluate_for(&day)?;
        Ok((day, changed))
    }

    /// Attach a reason tag to today and add it to the profile vocabulary
    pub fn add_tag(&mut self, tag: &str) -> Result<bool> {
        let mut day = self.today_counters();
        let added = day.add_tag(tag);
        if added {
            self.storage.save_day_data(&day)?;
            let mut profile = self.storage.get_profile_for_update()?;
            if insert_label(&mut profile.tags, tag) {
                self.storage.save_profile(&profile)?;
            }
        }
        Ok(added)
    }

    /// Attach a coping strategy to today and add it to the profile vocabulary
    pub fn add_strategy(&mut self, strategy: &str) -> Result<bool> {
        let mut day = self.today_counters();
        let added = day.add_strategy(strategy);
        if added {
            self.storage.save_day_data(&day)?;
            let mut profile = self.storage.get_profile_for_update()?;
            if insert_label(&mut profile.strategies, strategy) {
                self.storage.save_profile(&profile)?;
            }
        }
        Ok(added)
    }

    /// Record a workout for today. Returns false if one was already logged.
    pub fn log_workout(&mut self) -> Result<bool> {
        let mut profile = self.storage.get_profile_for_update()?;
        if profile.workout_dates.contains(&self.today) {
            return Ok(false);
        }
        profile.workout_dates.push(self.today);
        profile.workout_dates.sort();
        self.storage.save_profile(&profile)?;
        Ok(true)
    }

    /// Today's compliance against the stored plan, if one is running
    pub fn plan_feedback(&self) -> Option<DailyFeedback> {
        let plan = self.storage.get_plan()?;
        plan::evaluate_today(&plan, self.today_counters().total())
    }

    /// Evaluate active challenges against today's counters
    pub fn refresh_challenges(&mut self) -> Result<Vec<SubscribedChallenge>> {
        let day = self.today_counters();
        self.evaluate_for(&day)
    }

    fn evaluate_for(&mut self, day: &DayCounters) -> Result<Vec<SubscribedChallenge>> {
        let mut subs = self.storage.get_subscribed_challenges();
        let history = self.storage.get_all_data();
        let changed = challenge::evaluate_active(&mut subs, day, &history);
        if !changed.is_empty() {
            self.storage.save_subscribed_challenges(&subs)?;
        }
        Ok(changed)
    }
}
