/// Middleware module
///
/// Credential extractors used by protected routes.

mod authenticated;

pub use authenticated::{authorization_header, AuthenticatedUser, PresentedApiKey};
