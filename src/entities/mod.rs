//! Entity module - Contains all SeaORM entity definitions for the database.
//! Families own students and fee records; `system_state` holds bookkeeping values.

pub mod family;
pub mod fee;
pub mod student;
pub mod system_state;

// Re-export specific types to avoid conflicts
pub use family::{Column as FamilyColumn, Entity as Family, Model as FamilyModel};
pub use fee::{Column as FeeColumn, Entity as Fee, FeeStatus, Model as FeeModel};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
