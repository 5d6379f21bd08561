pub mod user;
pub mod hypermedia;

pub use user::*;
pub use hypermedia::*;
