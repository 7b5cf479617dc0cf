pub mod expand;
pub mod frequency;
pub mod policy;
pub mod validate;
pub mod verify;
