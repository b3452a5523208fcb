//! Medicine manager: the single owner of the tracker's in-memory state.
//!
//! Every user action goes through here. The manager validates input, runs the
//! storage mutation, records history in the required order, then rebuilds
//! today's schedule and refreshes the cached refill list and adherence rate.
//!
//! Storage failures never reach the caller: they are logged and turned into a
//! safe default (`None`/`false` for mutations, empty lists, zero counts).
//! Validation failures are returned before anything is written.
//!
//! Methods ending in `_at` take the local wall-clock time explicitly; the
//! plain variants use the system clock.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::{self, DailySummary};
use crate::db::{DatabaseError, MedicineStore};
use crate::export;
use crate::history;
use crate::models::*;
use crate::sample;
use crate::schedule;
use crate::settings;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_DOSAGE_LEN: usize = 100;
pub const MAX_FREQUENCY_LEN: usize = 200;
pub const MAX_PRESCRIBER_LEN: usize = 200;
pub const MAX_NOTES_LEN: usize = 1000;
pub const MIN_QUANTITY: i32 = 1;
pub const MAX_QUANTITY: i32 = 1000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    EmptyField(&'static str),

    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("Quantity must be between 1 and 1000, got {0}")]
    QuantityOutOfRange(i32),
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn check_required(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    check_length(field, value, max)
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Field rules shared by add and edit.
pub fn validate_medicine(medicine: &Medicine) -> Result<(), ValidationError> {
    check_required("Name", &medicine.name, MAX_NAME_LEN)?;
    check_required("Dosage", &medicine.dosage, MAX_DOSAGE_LEN)?;
    check_required("Frequency", medicine.frequency.as_str(), MAX_FREQUENCY_LEN)?;
    check_length("Prescribed by", &medicine.prescribed_by, MAX_PRESCRIBER_LEN)?;
    check_length("Instructions", &medicine.instructions, MAX_NOTES_LEN)?;
    check_length("Side effects", &medicine.side_effects, MAX_NOTES_LEN)?;
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&medicine.quantity) {
        return Err(ValidationError::QuantityOutOfRange(medicine.quantity));
    }
    Ok(())
}

fn trimmed(medicine: &Medicine) -> Medicine {
    Medicine {
        name: medicine.name.trim().to_string(),
        dosage: medicine.dosage.trim().to_string(),
        prescribed_by: medicine.prescribed_by.trim().to_string(),
        instructions: medicine.instructions.trim().to_string(),
        side_effects: medicine.side_effects.trim().to_string(),
        ..medicine.clone()
    }
}

/// Logs a failed storage read and substitutes the empty value.
fn or_default<T: Default>(operation: &'static str, result: Result<T, DatabaseError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(operation, error = %e, "Storage query failed");
        T::default()
    })
}

pub struct MedicineManager<S: MedicineStore> {
    store: S,
    today_dosages: Vec<DosageInstance>,
    upcoming_refills: Vec<Medicine>,
    adherence_rate: f64,
}

impl<S: MedicineStore> MedicineManager<S> {
    /// Caches start empty; call [`Self::refresh`] to load them.
    pub fn new(store: S) -> Self {
        Self {
            store,
            today_dosages: Vec::new(),
            upcoming_refills: Vec::new(),
            adherence_rate: 0.0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Today's doses, earliest first, as of the last regeneration.
    pub fn today_dosages(&self) -> &[DosageInstance] {
        &self.today_dosages
    }

    /// Active medicines due for refill within seven days, soonest first.
    pub fn upcoming_refills(&self) -> &[Medicine] {
        &self.upcoming_refills
    }

    pub fn adherence_rate(&self) -> f64 {
        self.adherence_rate
    }

    // ── Medicine lifecycle ──────────────────────────────────────────────

    pub fn add_medicine(&mut self, input: MedicineInput) -> Result<Option<Uuid>, ValidationError> {
        self.add_medicine_at(input, now())
    }

    /// Returns the new id, or `None` when storage failed.
    pub fn add_medicine_at(
        &mut self,
        input: MedicineInput,
        now: NaiveDateTime,
    ) -> Result<Option<Uuid>, ValidationError> {
        let medicine = input.into_medicine(now);
        validate_medicine(&medicine)?;

        let result = self.store.with_transaction(|s| {
            s.insert_medicine(&medicine)?;
            history::append(
                s,
                medicine.id,
                history::ACTION_MEDICINE_ADDED,
                history::added_notes(&medicine.name),
                now,
            )
        });

        let added = match result {
            Ok(_) => {
                tracing::info!(medicine_id = %medicine.id, name = %medicine.name, "Medicine added");
                Some(medicine.id)
            }
            Err(e) => {
                tracing::error!(name = %medicine.name, error = %e, "Failed to add medicine");
                None
            }
        };
        self.after_change(now);
        Ok(added)
    }

    pub fn update_medicine(&mut self, medicine: &Medicine) -> Result<bool, ValidationError> {
        self.update_medicine_at(medicine, now())
    }

    /// Persists every editable field of `medicine`. `id` and `created_at`
    /// identify the record and are not changed. Returns false when storage
    /// failed or the medicine no longer exists.
    pub fn update_medicine_at(
        &mut self,
        medicine: &Medicine,
        now: NaiveDateTime,
    ) -> Result<bool, ValidationError> {
        let medicine = trimmed(medicine);
        validate_medicine(&medicine)?;

        let result = self.store.with_transaction(|s| {
            s.update_medicine(&medicine)?;
            history::append(
                s,
                medicine.id,
                history::ACTION_MEDICINE_UPDATED,
                history::updated_notes(&medicine.name),
                now,
            )
        });

        let updated = match result {
            Ok(_) => {
                tracing::info!(
                    medicine_id = %medicine.id,
                    is_active = medicine.is_active,
                    "Medicine updated"
                );
                true
            }
            Err(e) => {
                tracing::error!(medicine_id = %medicine.id, error = %e, "Failed to update medicine");
                false
            }
        };
        self.after_change(now);
        Ok(updated)
    }

    pub fn deactivate_medicine(&mut self, id: &Uuid) -> bool {
        self.deactivate_medicine_at(id, now())
    }

    /// Soft removal: the medicine stays for history but leaves every active view.
    /// Stored fields are not re-validated.
    pub fn deactivate_medicine_at(&mut self, id: &Uuid, now: NaiveDateTime) -> bool {
        let result = self.store.with_transaction(|s| {
            let Some(mut medicine) = s.get_medicine(id)? else {
                return Ok(false);
            };
            medicine.is_active = false;
            s.update_medicine(&medicine)?;
            history::append(
                s,
                medicine.id,
                history::ACTION_MEDICINE_UPDATED,
                history::updated_notes(&medicine.name),
                now,
            )?;
            Ok(true)
        });

        let deactivated = match result {
            Ok(true) => {
                tracing::info!(medicine_id = %id, "Medicine deactivated");
                true
            }
            Ok(false) => {
                tracing::warn!(medicine_id = %id, "Cannot deactivate unknown medicine");
                false
            }
            Err(e) => {
                tracing::error!(medicine_id = %id, error = %e, "Failed to deactivate medicine");
                false
            }
        };
        self.after_change(now);
        deactivated
    }

    pub fn delete_medicine(&mut self, id: &Uuid) -> bool {
        self.delete_medicine_at(id, now())
    }

    /// Records the deletion first so the name is captured, then removes the
    /// medicine's doses and the medicine itself in one transaction.
    pub fn delete_medicine_at(&mut self, id: &Uuid, now: NaiveDateTime) -> bool {
        let result = self.store.with_transaction(|s| {
            let Some(medicine) = s.get_medicine(id)? else {
                return Ok(false);
            };
            history::append(
                s,
                medicine.id,
                history::ACTION_MEDICINE_DELETED,
                history::deleted_notes(&medicine.name),
                now,
            )?;
            let doses = s.delete_dosages(&DosageFilter::medicine(medicine.id))?;
            s.delete_medicine(&medicine.id)?;
            tracing::info!(medicine_id = %medicine.id, doses, "Medicine deleted");
            Ok(true)
        });

        let deleted = match result {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(medicine_id = %id, "Cannot delete unknown medicine");
                false
            }
            Err(e) => {
                tracing::error!(medicine_id = %id, error = %e, "Failed to delete medicine");
                false
            }
        };
        self.after_change(now);
        deleted
    }

    // ── Dosage schedule ─────────────────────────────────────────────────

    pub fn toggle_dosage_taken(&mut self, dosage_id: &Uuid) -> Option<DosageInstance> {
        self.toggle_dosage_taken_at(dosage_id, now())
    }

    /// Flips the dose, logs it to history and recomputes adherence.
    pub fn toggle_dosage_taken_at(
        &mut self,
        dosage_id: &Uuid,
        now: NaiveDateTime,
    ) -> Option<DosageInstance> {
        let toggled = match schedule::toggle_dosage(&self.store, dosage_id, now) {
            Ok(Some(dosage)) => dosage,
            Ok(None) => {
                tracing::warn!(dosage_id = %dosage_id, "Cannot toggle unknown dosage");
                return None;
            }
            Err(e) => {
                tracing::error!(dosage_id = %dosage_id, error = %e, "Failed to toggle dosage");
                return None;
            }
        };

        if let Some(cached) = self.today_dosages.iter_mut().find(|d| d.id == toggled.id) {
            *cached = toggled.clone();
        }
        self.adherence_rate = analysis::adherence_rate(&self.today_dosages);
        tracing::debug!(dosage_id = %dosage_id, is_taken = toggled.is_taken, "Dosage toggled");
        Some(toggled)
    }

    pub fn regenerate(&mut self) {
        self.regenerate_at(now());
    }

    /// Rebuilds today's schedule and recomputes adherence.
    pub fn regenerate_at(&mut self, now: NaiveDateTime) {
        self.today_dosages = schedule::regenerate_for_day(&self.store, now.date());
        self.adherence_rate = analysis::adherence_rate(&self.today_dosages);
    }

    pub fn refresh(&mut self) {
        self.refresh_at(now());
    }

    /// Regenerates the schedule and reloads the upcoming refill list.
    pub fn refresh_at(&mut self, now: NaiveDateTime) {
        self.after_change(now);
    }

    pub fn refresh_refills_at(&mut self, now: NaiveDateTime) {
        self.upcoming_refills = or_default(
            "upcoming_refills",
            analysis::upcoming_refills_at(&self.store, now),
        );
    }

    fn after_change(&mut self, now: NaiveDateTime) {
        self.regenerate_at(now);
        self.refresh_refills_at(now);
    }

    // ── Refill queries ──────────────────────────────────────────────────

    pub fn overdue_refills(&self) -> Vec<Medicine> {
        self.overdue_refills_at(now())
    }

    pub fn overdue_refills_at(&self, now: NaiveDateTime) -> Vec<Medicine> {
        or_default("overdue_refills", analysis::overdue_refills_at(&self.store, now))
    }

    pub fn overdue_refills_count(&self) -> u32 {
        self.overdue_refills_count_at(now())
    }

    pub fn overdue_refills_count_at(&self, now: NaiveDateTime) -> u32 {
        or_default(
            "overdue_refill_count",
            analysis::overdue_refill_count_at(&self.store, now),
        )
    }

    pub fn refills_due_within_days(&self, days: i64) -> Vec<Medicine> {
        self.refills_due_within_days_at(days, now())
    }

    pub fn refills_due_within_days_at(&self, days: i64, now: NaiveDateTime) -> Vec<Medicine> {
        or_default(
            "refills_due_within_days",
            analysis::refills_due_within_days_at(&self.store, now, days),
        )
    }

    pub fn refills_due_today(&self) -> Vec<Medicine> {
        self.refills_due_today_at(now())
    }

    pub fn refills_due_today_at(&self, now: NaiveDateTime) -> Vec<Medicine> {
        or_default("refills_due_today", analysis::refills_due_today_at(&self.store, now))
    }

    pub fn refills_due_tomorrow(&self) -> Vec<Medicine> {
        self.refills_due_tomorrow_at(now())
    }

    pub fn refills_due_tomorrow_at(&self, now: NaiveDateTime) -> Vec<Medicine> {
        or_default(
            "refills_due_tomorrow",
            analysis::refills_due_tomorrow_at(&self.store, now),
        )
    }

    /// Overdue medicines plus those due within the alert window.
    pub fn refill_alerts_at(&self, now: NaiveDateTime) -> Vec<Medicine> {
        or_default("refill_alerts", analysis::refill_alerts_at(&self.store, now))
    }

    pub fn refill_alert_message(&self) -> Option<String> {
        self.refill_alert_message_at(now())
    }

    pub fn refill_alert_message_at(&self, now: NaiveDateTime) -> Option<String> {
        analysis::refill_alert_message(&self.refill_alerts_at(now), now)
    }

    // ── Listings and statistics ─────────────────────────────────────────

    pub fn get_medicine(&self, id: &Uuid) -> Option<Medicine> {
        or_default("get_medicine", self.store.get_medicine(id))
    }

    /// Active medicines, by name.
    pub fn all_medicines(&self) -> Vec<Medicine> {
        or_default(
            "all_medicines",
            self.store.query_medicines(&MedicineFilter::active()),
        )
    }

    /// Active medicines whose name or category contains `query`, ignoring
    /// case. A blank query lists them all.
    pub fn search_medicines(&self, query: &str) -> Vec<Medicine> {
        or_default(
            "search_medicines",
            self.store.query_medicines(&MedicineFilter::search(query)),
        )
    }

    pub fn total_medicines(&self) -> u32 {
        or_default(
            "total_medicines",
            self.store.count_medicines(&MedicineFilter::active()),
        )
    }

    pub fn category_counts(&self) -> BTreeMap<String, u32> {
        analysis::category_counts(&self.all_medicines())
    }

    pub fn daily_summary(&self) -> DailySummary {
        self.daily_summary_at(now())
    }

    /// Built from the cached schedule and refill list plus a live overdue count.
    pub fn daily_summary_at(&self, now: NaiveDateTime) -> DailySummary {
        DailySummary::compute(
            self.total_medicines(),
            &self.today_dosages,
            self.overdue_refills_count_at(now),
            self.upcoming_refills.len() as u32,
        )
    }

    /// All history, newest first.
    pub fn history(&self) -> Vec<HistoryItem> {
        or_default("history", self.store.query_history(&HistoryFilter::default()))
    }

    pub fn medicine_history(&self, medicine_id: &Uuid) -> Vec<HistoryItem> {
        or_default(
            "medicine_history",
            self.store.query_history(&HistoryFilter {
                medicine_id: Some(*medicine_id),
                limit: None,
            }),
        )
    }

    // ── Data management ─────────────────────────────────────────────────

    /// Wipes medicines, doses and history. Settings are kept.
    pub fn reset_all_data(&mut self) -> bool {
        match self.store.with_transaction(|s| s.delete_all()) {
            Ok(()) => {
                self.today_dosages.clear();
                self.upcoming_refills.clear();
                self.adherence_rate = 0.0;
                tracing::info!("All medicine data reset");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reset data");
                false
            }
        }
    }

    /// Active medicines as CSV, by name.
    pub fn export_csv(&self) -> String {
        export::medicines_to_csv(&self.all_medicines())
    }

    pub fn seed_sample_data(&mut self) -> usize {
        self.seed_sample_data_at(now())
    }

    /// Adds the demonstration medicines when the store holds none at all,
    /// active or not. Returns how many were added.
    pub fn seed_sample_data_at(&mut self, now: NaiveDateTime) -> usize {
        match self.store.count_medicines(&MedicineFilter::default()) {
            Ok(0) => {}
            Ok(existing) => {
                tracing::debug!(existing, "Skipping sample data, medicines already present");
                return 0;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to check for existing medicines");
                return 0;
            }
        }

        let mut added = 0;
        for input in sample::sample_medicines(now) {
            if let Ok(Some(_)) = self.add_medicine_at(input, now) {
                added += 1;
            }
        }
        tracing::info!(added, "Sample data added");
        added
    }

    pub fn load_settings(&self) -> AppSettings {
        or_default("load_settings", settings::load_settings(&self.store))
    }

    pub fn save_settings(&self, app_settings: &AppSettings) -> bool {
        settings::save_settings(&self.store, app_settings)
            .map_err(|e| tracing::error!(error = %e, "Failed to save settings"))
            .is_ok()
    }
}
