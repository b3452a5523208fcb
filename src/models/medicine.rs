use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Category, DosageForm};
use super::frequency::Frequency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    /// Strength as written on the label, e.g. "500mg".
    pub dosage: String,
    pub dosage_form: DosageForm,
    pub frequency: Frequency,
    /// `None` when the stored label is missing or unrecognised.
    pub category: Option<Category>,
    pub prescribed_by: String,
    pub instructions: String,
    pub side_effects: String,
    pub quantity: i32,
    pub refill_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub is_active: bool,
}

/// Fields supplied when adding a medicine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineInput {
    pub name: String,
    pub dosage: String,
    pub dosage_form: DosageForm,
    pub frequency: Frequency,
    pub category: Category,
    pub prescribed_by: String,
    pub instructions: String,
    pub side_effects: String,
    pub quantity: i32,
    pub refill_date: Option<NaiveDateTime>,
}

impl MedicineInput {
    /// Input with the add-form defaults: tablet, once daily, General, 30 units.
    pub fn new(name: impl Into<String>, dosage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dosage: dosage.into(),
            dosage_form: DosageForm::Tablet,
            frequency: Frequency::OnceDaily,
            category: Category::General,
            prescribed_by: String::new(),
            instructions: String::new(),
            side_effects: String::new(),
            quantity: 30,
            refill_date: None,
        }
    }

    /// Builds the persisted record: fresh id, active, created now.
    pub fn into_medicine(self, created_at: NaiveDateTime) -> Medicine {
        Medicine {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            dosage: self.dosage.trim().to_string(),
            dosage_form: self.dosage_form,
            frequency: self.frequency,
            category: Some(self.category),
            prescribed_by: self.prescribed_by.trim().to_string(),
            instructions: self.instructions.trim().to_string(),
            side_effects: self.side_effects.trim().to_string(),
            quantity: self.quantity,
            refill_date: self.refill_date,
            created_at,
            is_active: true,
        }
    }
}
