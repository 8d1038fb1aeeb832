//! End-to-end reconciliation: compose a thread optimistically, vote on
//! it, confirm pieces out of order, and check the client-visible view
//! at each step.

use std::sync::Arc;

use serde_json::json;
use tribune_identity::{BlockOrder, IdentityCodec};
use tribune_pending::{PendingStore, SubmissionResult};
use tribune_types::{ActionJson, ActionRecord, Crud, EntityStatus, EntityType};

const ALICE: &str = "did:tribune:alice";
const CHAIN: u16 = 3;

fn create(entity_type: EntityType, parent_id: Option<&str>, params: serde_json::Value) -> ActionJson {
    ActionJson {
        crud: Crud::Post,
        entity_type,
        parent_id: parent_id.map(str::to_string),
        crud_entity_id: None,
        params,
    }
}

fn confirmed(hash: &str, action: ActionJson, timestamp: u64, block: u64, txn: u16) -> ActionRecord {
    ActionRecord {
        id: hash.to_string(),
        action_id: hash.to_string(),
        pending_id: None,
        action,
        chain_id: CHAIN,
        creator_id: ALICE.to_string(),
        block_order: BlockOrder::new(timestamp, CHAIN, block, txn).pack(None),
        status: EntityStatus::Active,
    }
}

#[test]
fn optimistic_thread_reconciles_against_out_of_order_confirmations() {
    let codec = Arc::new(IdentityCodec::new());
    let store = PendingStore::new(codec.clone());

    // A forum the server already confirmed.
    let forum_id = codec
        .postbox_id(
            EntityType::Forum,
            None,
            "aaaaaaaaaaaaaaaa",
            &BlockOrder::new(1_600_000_000, CHAIN, 100, 1),
        )
        .unwrap();

    // Compose a topic, then a post under the topic's optimistic id,
    // then an upvote on the optimistic post.
    store.compose_action(
        create(EntityType::Topic, Some(&forum_id), json!({ "title": "hello" })),
        ALICE,
        CHAIN,
        1_700_000_000,
    );
    store
        .mark_submitted("Pending1", "bbbbbbbbbbbbbbbb", 1_700_000_000)
        .unwrap();

    let topic_id = {
        let snapshot = store.snapshot();
        snapshot
            .overlay()
            .entities
            .values()
            .find(|e| e.entity_type == EntityType::Topic)
            .unwrap()
            .id
            .clone()
    };
    assert!(topic_id.contains("bbbbbbbbbbbbbbbb"));

    store.compose_action(
        create(EntityType::Post, Some(&topic_id), json!({ "body": "first" })),
        ALICE,
        CHAIN,
        1_700_000_010,
    );
    store
        .mark_submitted("Pending2", "cccccccccccccccc", 1_700_000_010)
        .unwrap();

    let post_id = {
        let snapshot = store.snapshot();
        snapshot
            .overlay()
            .entities
            .values()
            .find(|e| e.entity_type == EntityType::Post)
            .unwrap()
            .id
            .clone()
    };

    store.compose_action(
        create(EntityType::Vote, Some(&post_id), json!({ "value": 1 })),
        ALICE,
        CHAIN,
        1_700_000_020,
    );
    store
        .mark_submitted("Pending3", "dddddddddddddddd", 1_700_000_020)
        .unwrap();

    // The optimistic view: topic, post, vote, a synthesized count with
    // an upvote edit, and the implied author.
    {
        let snapshot = store.snapshot();
        let overlay = snapshot.overlay();
        assert!(overlay
            .entities
            .values()
            .any(|e| e.entity_type == EntityType::Vote));
        assert_eq!(
            overlay
                .entities
                .values()
                .filter(|e| e.entity_type == EntityType::User)
                .count(),
            1
        );
        let count_key = codec.normalize_id(
            &codec
                .link_id(EntityType::Count, &post_id, &format!("{:x}", CHAIN))
                .unwrap(),
        );
        assert_eq!(overlay.edits[&count_key].fields["upVotes"], json!(1));
    }

    // The post confirms before the topic. Its segment upgrades; the
    // topic segment inside its id stays optimistic.
    store
        .handle_submission_result(
            "cccccccccccccccc",
            SubmissionResult {
                status: EntityStatus::Active,
                confirmed_action: Some(confirmed(
                    "cccccccccccccccc",
                    create(EntityType::Post, Some(&topic_id), json!({ "body": "first" })),
                    1_700_000_030,
                    210,
                    0,
                )),
            },
        )
        .unwrap();

    // The vote survives and its target picked up the confirmed post
    // segment, while the topic segment stays optimistic.
    {
        let vote = store.get_by_action_id("dddddddddddddddd").unwrap();
        let target = vote.record.action.parent_id.clone().unwrap();
        assert!(target.contains("cccccccccccccccc"));
        assert!(target.contains("?bbbbbbbbbbbbbbbb"));
    }

    // Now the topic confirms with real block fields.
    store
        .handle_submission_result(
            "bbbbbbbbbbbbbbbb",
            SubmissionResult {
                status: EntityStatus::Active,
                confirmed_action: Some(confirmed(
                    "bbbbbbbbbbbbbbbb",
                    create(EntityType::Topic, Some(&forum_id), json!({ "title": "hello" })),
                    1_700_000_005,
                    200,
                    2,
                )),
            },
        )
        .unwrap();

    // The vote is still pending; its target id must now run through
    // the confirmed topic and post segments.
    let vote = store.get_by_action_id("dddddddddddddddd").unwrap();
    let vote_target = vote.record.action.parent_id.unwrap();
    assert!(!vote_target.contains('?'));
    assert!(vote_target.contains("bbbbbbbbbbbbbbbb"));
    assert!(vote_target.contains("cccccccccccccccc"));

    // Normalization bridged the rename: the pending count edit is keyed
    // the same before and after confirmation.
    let confirmed_count_key = codec.normalize_id(
        &codec
            .link_id(EntityType::Count, &vote_target, &format!("{:x}", CHAIN))
            .unwrap(),
    );
    {
        let snapshot = store.snapshot();
        assert_eq!(
            snapshot.overlay().edits[&confirmed_count_key].fields["upVotes"],
            json!(1)
        );
    }

    // Finally the vote is rejected: its synthesized rows and counter
    // edits disappear, the confirmed entities stay.
    let err = store
        .handle_submission_result(
            "dddddddddddddddd",
            SubmissionResult {
                status: EntityStatus::Error,
                confirmed_action: None,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        tribune_pending::PendingError::ActionRejected { .. }
    ));

    let snapshot = store.snapshot();
    assert!(snapshot
        .overlay()
        .entities
        .values()
        .all(|e| e.entity_type != EntityType::Vote));
    assert!(!snapshot.overlay().edits.contains_key(&confirmed_count_key));
    assert!(snapshot.pending_actions().is_empty());
}
