mod property_roundtrip;
pub mod utils;
