pub mod bbox;
pub mod newtype_index;
