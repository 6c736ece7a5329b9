//! Session-key isolation and its inverse.
//!
//! A raw session key has the shape `platform:messageType:rawId` and names one
//! group, channel or friend chat. When per-user isolation is enabled, a
//! reminder created in a shared chat is filed under an *isolated* key that
//! carries the creator's id as an underscore suffix, so two users in the same
//! room keep separate reminder lists.
//!
//! Isolation must be invertible for delivery: a fired reminder is always sent
//! to the raw chat, never to the synthetic per-user key. The inverse is
//! platform-aware because wechat-family raw ids legitimately contain
//! underscores, so blindly splitting on the last underscore would corrupt
//! them. Any ambiguity fails closed: [`deisolate`] returns its input
//! unchanged rather than guess.

/// Platforms whose raw ids may contain underscores (`wxid_abc123`).
pub const WECHAT_PLATFORMS: [&str; 3] = ["gewechat", "wechatpadpro", "wecom"];

fn is_wechat_platform(key: &str) -> bool {
    WECHAT_PLATFORMS.iter().any(|p| key.starts_with(p))
}

/// True for raw keys that name a shared chat where multiple creators can
/// coexist, detected by the platform's message-type marker.
fn is_shared_chat(raw: &str) -> bool {
    raw.contains(":GroupMessage:")
        || raw.contains("@chatroom")
        || raw.contains(":ChannelMessage:")
        || raw.contains(":PrivateMessage:")
}

/// Derive the per-creator session key from a raw chat-origin key.
///
/// Identity when isolation is disabled or the creator is unknown. For
/// shared-chat shapes the creator id is appended to the last colon-delimited
/// segment; any other shape gets the suffix appended to the whole key.
pub fn isolate(raw: &str, creator_id: &str, unique_session: bool) -> String {
    if !unique_session || creator_id.is_empty() {
        return raw.to_string();
    }

    if is_shared_chat(raw) {
        if let Some((head, tail)) = raw.rsplit_once(':') {
            return format!("{}:{}_{}", head, tail, creator_id);
        }
    }
    format!("{}_{}", raw, creator_id)
}

/// Recover the raw chat-origin key from a possibly isolated session key.
///
/// Returns the input unchanged when it does not unambiguously match an
/// isolation pattern.
pub fn deisolate(key: &str) -> String {
    // Wechat group rooms: `platform:GroupMessage:123@chatroom_wxid_abc` is the
    // isolated form, `...:123@chatroom` the raw one.
    if let Some((before, after)) = key.split_once("@chatroom") {
        if after.starts_with('_') {
            let room_id = before.rsplit(':').next().unwrap_or(before);
            let segments: Vec<&str> = key.splitn(3, ':').collect();
            let platform_prefix = if segments.len() == 3 {
                format!("{}:{}:", segments[0], segments[1])
            } else {
                String::new()
            };
            return format!("{}{}@chatroom", platform_prefix, room_id);
        }
        return key.to_string();
    }

    if !key.contains('_') || !key.contains(':') {
        return key.to_string();
    }

    if is_wechat_platform(key) {
        // Wechat personal ids contain underscores, so only the explicit group
        // isolation pattern is stripped; everything else passes through.
        if key.contains(":GroupMessage:") {
            if let Some((head, tail)) = key.rsplit_once(':') {
                if let Some((group_id, _creator)) = tail.rsplit_once('_') {
                    return format!("{}:{}", head, group_id);
                }
            }
        }
        return key.to_string();
    }

    // Generic rule: the isolation suffix lives after the last underscore of
    // the last colon-delimited segment.
    if let Some((head, tail)) = key.rsplit_once(':') {
        if let Some((id, _creator)) = tail.rsplit_once('_') {
            return format!("{}:{}", head, id);
        }
    }
    key.to_string()
}

// ── tests ───────────────────────────────────────────────────────────────
