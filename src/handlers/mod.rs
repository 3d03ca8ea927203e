mod admin_handler;
mod document_handler;
mod help_handler;
mod session_handler;
mod update_router;

pub use update_router::process_update;
