pub mod bucket_bar;
pub mod item_card;
pub mod progress_bar;
pub mod quiz_options;
pub mod session_summary;
