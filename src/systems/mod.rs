//! Rule systems. Each one validates against a `&World` and mutates through
//! the narrow setters on `World` only after every check has passed.

pub mod build;
pub mod combat;
pub mod economy;
pub mod movement;
pub mod recruit;
pub mod territory;

pub use build::{CityReport, MineReport};
pub use combat::{AttackPreview, AttackReport};
pub use economy::{DepositIncome, IncomeSystem, Ledger, Wallet};
pub use movement::{MoveReport, ReadinessSystem};
pub use recruit::RecruitReport;
