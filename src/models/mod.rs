pub mod dates;
pub mod enums;
pub mod exam;
pub mod fields;
pub mod reference;
pub mod settings;
pub mod worker;

pub use enums::*;
pub use exam::*;
pub use reference::*;
pub use settings::*;
pub use worker::*;
