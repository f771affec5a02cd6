/// Separator between account id and account entity id in a derived entity id
pub const ENTITY_ID_DELIMITER: char = ':';

/// Separator between realm definition id and account index in an account id
pub const ACCOUNT_ID_DELIMITER: char = '~';

/// Separator between the two participants in a private chat's account entity id
pub const PRIVATE_CHAT_DELIMITER: char = '_';

/// Maximum number of bound values in a single `IN (...)` clause.
///
/// SQLite builds with `SQLITE_MAX_VARIABLE_NUMBER = 999`; one slot is kept for
/// the owner id bound next to the list.
pub const MAX_IN_COUNT: usize = 900;

/// Chat property holding whether the chat is a one-to-one conversation
pub const PROPERTY_PRIVATE: &str = "private";

/// Well-known user properties
pub const PROPERTY_FIRST_NAME: &str = "first_name";
pub const PROPERTY_LAST_NAME: &str = "last_name";
pub const PROPERTY_NICKNAME: &str = "nickname";
pub const PROPERTY_ONLINE: &str = "online";
pub const PROPERTY_PHONE: &str = "phone";
