mod announcement;
mod event;
mod forum;
mod resource;
mod thread;
pub mod token;
mod user;

pub use announcement::AnnouncementModel;
pub use event::EventModel;
pub use forum::{ForumModel, PostModel, TopicModel};
pub use resource::{PaginationModel, ResourceListModel, ResourceModel};
pub use thread::{ThreadListModel, ThreadModel};
pub use token::{
    AUTH_TOKEN_HEADER,
    CSRF_HEADER,
    Claims,
    Token,
    csrf_cookie,
    new_csrf_token,
    removed_token_cookie,
    token_cookie,
    token_from_request
};
pub use user::{AuthModel, AuthorModel, UserModel, authors};
