//! First-run demonstration medicines.

use chrono::{Duration, NaiveDateTime};

use crate::models::enums::{Category, DosageForm};
use crate::models::{Frequency, MedicineInput};

/// Three medicines with refills spread over the next two weeks.
/// Metformin falls inside the refill alert window.
pub fn sample_medicines(now: NaiveDateTime) -> Vec<MedicineInput> {
    vec![
        MedicineInput {
            name: "Aspirin".into(),
            dosage: "100mg".into(),
            dosage_form: DosageForm::Tablet,
            frequency: Frequency::OnceDaily,
            category: Category::PainRelief,
            prescribed_by: "Dr. Smith".into(),
            instructions: "Take with food to avoid stomach upset".into(),
            side_effects: "May cause stomach irritation".into(),
            quantity: 30,
            refill_date: Some(now + Duration::days(7)),
        },
        MedicineInput {
            name: "Vitamin D".into(),
            dosage: "1000 IU".into(),
            dosage_form: DosageForm::Capsule,
            frequency: Frequency::OnceDaily,
            category: Category::Vitamins,
            prescribed_by: "Dr. Johnson".into(),
            instructions: "Take in the morning with breakfast".into(),
            side_effects: "Generally well tolerated".into(),
            quantity: 60,
            refill_date: Some(now + Duration::days(14)),
        },
        MedicineInput {
            name: "Metformin".into(),
            dosage: "500mg".into(),
            dosage_form: DosageForm::Tablet,
            frequency: Frequency::TwiceDaily,
            category: Category::Diabetes,
            prescribed_by: "Dr. Brown".into(),
            instructions: "Take with meals to reduce side effects".into(),
            side_effects: "May cause nausea or diarrhea initially".into(),
            quantity: 60,
            refill_date: Some(now + Duration::days(2)),
        },
    ]
}
