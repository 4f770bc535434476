pub mod access;
pub mod domain;
pub mod pagination;
pub mod ports;

pub use access::{parse_note_id, AccessError, AccessResult, NoteAccessController, NoteInput, ReadPolicy};
pub use domain::{Identity, NewNote, Note, User, UserCredentials};
pub use pagination::{NotePage, Pagination, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use ports::{
    AuthStore, NoteFilter, NoteStore, PortError, PortResult, UserDirectory, UsernameMatch,
};
