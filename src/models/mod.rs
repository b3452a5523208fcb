pub mod dosage;
pub mod enums;
pub mod filters;
pub mod frequency;
pub mod history;
pub mod medicine;
pub mod settings;

pub use dosage::*;
pub use filters::*;
pub use frequency::*;
pub use history::*;
pub use medicine::*;
pub use settings::*;
