mod money;

pub mod helpers;
pub mod op;

pub use money::{Kilograms, Money, MoneyConversionError, RUPEE_CURRENCY_CODE};
