pub mod interval;
pub mod raw;
pub mod record;
pub mod rejection;
