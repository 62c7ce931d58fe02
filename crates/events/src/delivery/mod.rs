//! External delivery channels for platform notifications.

pub mod email;
