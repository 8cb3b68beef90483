//! Request extractors; every rejection renders through `ApiError`

mod auth;
mod pagination;
mod path;
mod validated;

pub use auth::AuthUser;
pub use pagination::Pagination;
pub use path::{ConversationPath, MessagePath};
pub use validated::{JsonBody, OptionalJson, ValidatedJson, ValidatedQuery};
