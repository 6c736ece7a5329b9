mod common;

use proptest::prelude::*;

use remindbot::session::{deisolate, isolate, WECHAT_PLATFORMS};

#[test]
fn isolation_disabled_is_identity() {
    let raw = "aiocqhttp:GroupMessage:12345";
    assert_eq!(isolate(raw, "alice", false), raw);
}

#[test]
fn empty_creator_is_identity() {
    let raw = "aiocqhttp:GroupMessage:12345";
    assert_eq!(isolate(raw, "", true), raw);
}

#[test]
fn group_key_appends_creator_to_last_segment() {
    let key = isolate("aiocqhttp:GroupMessage:12345", "alice", true);
    assert_eq!(key, "aiocqhttp:GroupMessage:12345_alice");
}

#[test]
fn wechat_chatroom_roundtrip() {
    let raw = "gewechat:GroupMessage:987@chatroom";
    let key = isolate(raw, "wxid_abc", true);
    assert_eq!(key, "gewechat:GroupMessage:987@chatroom_wxid_abc");
    assert_eq!(deisolate(&key), raw);
}

#[test]
fn wechat_private_key_fails_closed() {
    // Non-room wechat keys are ambiguous (wxids contain underscores), so
    // deisolation leaves them untouched rather than guessing.
    for platform in WECHAT_PLATFORMS {
        let key = format!("{platform}:FriendMessage:wxid_a_b");
        assert_eq!(deisolate(&key), key);
    }
}

#[test]
fn deisolate_raw_key_is_identity() {
    // A never-isolated key must survive deisolation; the fire path calls
    // deisolate unconditionally.
    let raw = "telegram:GroupMessage:12345";
    assert_eq!(deisolate(raw), raw);
}

fn non_wechat_raw_key() -> impl Strategy<Value = String> {
    common::generic_raw_key()
        .prop_filter("wechat platforms are not invertible", |k| {
            !WECHAT_PLATFORMS.iter().any(|p| k.starts_with(p))
        })
}

proptest! {
    #![proptest_config(common::proptest_config())]

    #[test]
    fn isolate_then_deisolate_recovers_raw(
        raw in non_wechat_raw_key(),
        creator in common::creator_id(),
    ) {
        let key = isolate(&raw, &creator, true);
        prop_assert_ne!(&key, &raw);
        prop_assert_eq!(deisolate(&key), raw);
    }

    #[test]
    fn isolation_is_deterministic(
        raw in non_wechat_raw_key(),
        creator in common::creator_id(),
    ) {
        prop_assert_eq!(
            isolate(&raw, &creator, true),
            isolate(&raw, &creator, true)
        );
    }
}
