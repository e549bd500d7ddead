//! Constants used throughout the application
//!
//! This module centralizes user-facing messages and default values to keep
//! wording consistent between the identity, sync and app layers.

// Validation Error Messages
pub const MSG_PASSWORD_MISMATCH: &str = "The passwords you entered do not match. Please try again.";
pub const MSG_INVALID_MOBILE_NUMBER: &str = "Please enter a valid mobile number (10 to 15 digits, numbers only).";

// Identity Error Messages
pub const MSG_INVALID_EMAIL: &str = "The email address is not valid. Please check the format.";
pub const MSG_USER_DISABLED: &str = "Your account has been disabled. Please contact support.";
pub const MSG_USER_NOT_FOUND: &str = "No user found with this email. Please register or check your email.";
pub const MSG_WRONG_PASSWORD: &str = "The password you entered is incorrect. Please try again.";
pub const MSG_INVALID_CREDENTIAL: &str = "Invalid email or password. Please double-check your credentials.";
pub const MSG_EMAIL_IN_USE: &str = "This email is already registered. Please login or use a different email.";
pub const MSG_WEAK_PASSWORD: &str =
    "The password is too weak. Please choose a stronger password (at least 6 characters).";
pub const MSG_NETWORK_FAILURE: &str = "Network error. Please check your internet connection and try again.";
pub const MSG_REQUIRES_RECENT_LOGIN: &str =
    "This operation requires recent authentication. Please re-enter your password and try again.";
pub const MSG_NOT_SIGNED_IN: &str = "No user logged in.";
pub const MSG_DELETE_WRONG_PASSWORD: &str = "Incorrect password. Please try again.";

// Success Messages
pub const MSG_REGISTRATION_SUCCESS: &str = "Registration successful! Please log in with your new account.";
pub const MSG_ACCOUNT_DELETED: &str = "Your account has been deleted.";

// Banner Messages
pub const BANNER_LOAD_FAILED: &str = "❌ Failed to load your checklist";
pub const BANNER_SAVE_FAILED: &str = "❌ Failed to save your changes";
pub const BANNER_CONFLICT: &str = "⚠️ Your checklist changed elsewhere; showing the latest version";
pub const BANNER_REFUSED: &str = "❌ Restore the item before changing it";

// Empty States
pub const EMPTY_SEARCH: &str = "No matching tasks or lists found.";
pub const EMPTY_ARCHIVE: &str = "Your archive is empty.";

// Environment
pub const ENV_USER_ID: &str = "CHECKLIST_USER_ID";
pub const ERROR_NO_USER_ID: &str = "❌ Error: CHECKLIST_USER_ID environment variable not set";

// Defaults
/// Default strftime format for archive and deadline timestamps
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Default length of the celebration window after a completion, in seconds
pub const DEFAULT_CELEBRATION_SECONDS: u64 = 4;
/// Upper bound for the celebration window, in seconds
pub const MAX_CELEBRATION_SECONDS: u64 = 60;
/// Number of recent log lines kept in memory
pub const MAX_BUFFERED_LOG_LINES: usize = 500;

// Admin
pub const MSG_NO_ADMIN_PORTAL: &str = "Admin accounts are managed in the admin portal, but no portal URL is configured.";
