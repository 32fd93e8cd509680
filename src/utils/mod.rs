pub mod truncation;
