//! Turn a [`MergeResult`] into the ordered list of primitive operations that
//! brings the store in line with it.
//!
//! Per entity the property replacement is always delete-then-insert. A crash
//! between the two leaves the entity without properties, which the next sync
//! repairs; it never leaves a mix of old and new values.

use courier_shared::{ApiChat, EntityAware, User};

use crate::merge::MergeResult;
use crate::ops::StoreOp;

/// Split `ids` into chunks of at most `max` elements (`max` is clamped to 1)
pub fn chunk_ids(ids: &[String], max: usize) -> impl Iterator<Item = Vec<String>> + '_ {
    ids.chunks(max.max(1)).map(<[String]>::to_vec)
}

pub fn plan_chat_merge(
    owner_id: &str,
    result: &MergeResult<ApiChat>,
    max_in_count: usize,
) -> Vec<StoreOp> {
    let mut ops = Vec::new();

    for chat_ids in chunk_ids(result.removed_object_ids(), max_in_count) {
        ops.push(StoreOp::UnlinkChats {
            user_id: owner_id.to_string(),
            chat_ids,
        });
    }

    for updated in result.updated_objects() {
        push_chat_refresh(&mut ops, updated);
    }

    for linked in result.added_object_links() {
        push_chat_refresh(&mut ops, linked);
        ops.push(StoreOp::InsertChatLink {
            user_id: owner_id.to_string(),
            chat_id: linked.entity_id().to_string(),
        });
    }

    for added in result.added_objects() {
        let chat_id = added.entity_id().to_string();
        ops.push(StoreOp::InsertChat(added.chat.clone()));
        ops.push(StoreOp::InsertChatProperties(added.chat.clone()));
        ops.push(StoreOp::InsertChatLink {
            user_id: owner_id.to_string(),
            chat_id: chat_id.clone(),
        });
        for message in &added.messages {
            ops.push(StoreOp::InsertMessage {
                chat_id: chat_id.clone(),
                message: message.clone(),
            });
        }
        for participant in added.other_participants(owner_id) {
            ops.push(StoreOp::InsertChatLink {
                user_id: participant.entity_id().to_string(),
                chat_id: chat_id.clone(),
            });
        }
    }

    ops
}

fn push_chat_refresh(ops: &mut Vec<StoreOp>, api_chat: &ApiChat) {
    ops.push(StoreOp::UpdateChat(api_chat.chat.clone()));
    ops.push(StoreOp::DeleteChatProperties {
        chat_id: api_chat.entity_id().to_string(),
    });
    ops.push(StoreOp::InsertChatProperties(api_chat.chat.clone()));
}

pub fn plan_contact_merge(
    owner_id: &str,
    result: &MergeResult<User>,
    max_in_count: usize,
) -> Vec<StoreOp> {
    let mut ops = Vec::new();

    for contact_ids in chunk_ids(result.removed_object_ids(), max_in_count) {
        ops.push(StoreOp::UnlinkContacts {
            user_id: owner_id.to_string(),
            contact_ids,
        });
    }

    for updated in result.updated_objects() {
        push_user_refresh(&mut ops, updated);
    }

    for linked in result.added_object_links() {
        push_user_refresh(&mut ops, linked);
        ops.push(StoreOp::InsertContactLink {
            user_id: owner_id.to_string(),
            contact_id: linked.entity_id().to_string(),
        });
    }

    for added in result.added_objects() {
        ops.push(StoreOp::InsertUser(added.clone()));
        ops.push(StoreOp::InsertUserProperties(added.clone()));
        ops.push(StoreOp::InsertContactLink {
            user_id: owner_id.to_string(),
            contact_id: added.entity_id().to_string(),
        });
    }

    ops
}

fn push_user_refresh(ops: &mut Vec<StoreOp>, user: &User) {
    ops.push(StoreOp::UpdateUser(user.clone()));
    ops.push(StoreOp::DeleteUserProperties {
        user_id: user.entity_id().to_string(),
    });
    ops.push(StoreOp::InsertUserProperties(user.clone()));
}
