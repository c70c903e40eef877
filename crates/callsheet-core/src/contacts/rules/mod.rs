//! Field rules: regex building blocks and per-field normalizers.

pub mod email;
pub mod name;
pub mod patterns;
pub mod phone;
pub mod role;

pub use email::{extract_emails, is_valid_email, normalize_email};
pub use name::{clean_company, clean_name, collapse_whitespace, is_plausible_name};
pub use phone::{normalize_phone, phone_digits};
pub use role::{is_generic_role, match_role_preference, normalize_role, section_for_role};
