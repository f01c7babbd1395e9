/*
 * Responsibility
 * - 所有者認可 + command dispatch の core (HTTP に依存しない)
 * - identity: claim set → principal
 * - guard: 所有者チェック
 * - command / dispatcher: ImageCommand を 1 つの handler に流す
 */
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod identity;

pub use command::{ImageCommand, ImageOutcome};
pub use dispatcher::Dispatcher;
pub use error::GalleryError;
pub use identity::ClaimSet;
