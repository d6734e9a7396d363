mod post;

pub use post::{Post, PostWithComments, Visibility};
