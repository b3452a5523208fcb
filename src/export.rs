//! CSV export of the medication list.

use std::borrow::Cow;

use crate::models::Medicine;

pub const CSV_HEADER: &str = "Name,Dosage,Category,Frequency,Prescribed By,Quantity,Refill Date";
const NO_REFILL_DATE: &str = "Not set";
const REFILL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One header line plus one line per medicine, in the order given.
pub fn medicines_to_csv(medicines: &[Medicine]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for medicine in medicines {
        let refill_date = medicine
            .refill_date
            .map(|d| d.format(REFILL_DATE_FORMAT).to_string())
            .unwrap_or_else(|| NO_REFILL_DATE.to_string());
        let category = medicine.category.map(|c| c.as_str()).unwrap_or("");
        let quantity = medicine.quantity.to_string();

        let fields = [
            medicine.name.as_str(),
            medicine.dosage.as_str(),
            category,
            medicine.frequency.as_str(),
            medicine.prescribed_by.as_str(),
            quantity.as_str(),
            refill_date.as_str(),
        ];
        let line: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_field(f)).collect();
        csv.push_str(&line.join(","));
        csv.push('\n');
    }
    csv
}

/// Quotes a field containing a comma, quote or line break; inner quotes are doubled.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
