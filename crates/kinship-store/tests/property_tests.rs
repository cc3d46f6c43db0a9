//! Property-based tests for the relationship engine

use kinship_domain::{Bucket, Identity, Placement, Relationship, RelationshipStatus};
use kinship_store::{
    IdentityPath, MemoryIdentityDirectory, MemoryPathStore, PathStore, RelationshipStorage,
};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = RelationshipStatus> {
    prop_oneof![
        Just(RelationshipStatus::Pending),
        Just(RelationshipStatus::Confirmed),
        Just(RelationshipStatus::Ignored),
    ]
}

proptest! {
    #[test]
    fn prop_pair_follows_every_transition(
        initial in status_strategy(),
        // Which record id addresses each transition: false = sender side
        steps in prop::collection::vec((status_strategy(), any::<bool>()), 0..12)
    ) {
        let mut directory = MemoryIdentityDirectory::new();
        let x = directory.register(Identity::new("1", "organization", "x"));
        let y = directory.register(Identity::new("2", "organization", "y"));
        let mut storage = RelationshipStorage::new(MemoryPathStore::new(), directory);

        let saved = storage
            .save_relationship(Relationship::new(x.clone(), y.clone(), initial))
            .unwrap();
        let sender_side = saved.id.unwrap();
        let receiver_side = storage.store().find(sender_side).unwrap().unwrap().record.reciprocal;

        let mut expected = initial;
        for (status, via_receiver) in steps {
            let id = if via_receiver { receiver_side } else { sender_side };
            let mut relationship = storage.get_relationship(id).unwrap().unwrap();
            relationship.status = status;
            storage.save_relationship(relationship).unwrap();
            expected = status;
        }

        let sent = storage.store().find(sender_side).unwrap().unwrap();
        let received = storage.store().find(receiver_side).unwrap().unwrap();
        let placement = Placement::for_status(expected);

        prop_assert_eq!(sent.record.status, expected);
        prop_assert_eq!(received.record.status, expected);
        prop_assert_eq!(sent.bucket.bucket(), placement.sender);
        prop_assert_eq!(received.bucket.bucket(), placement.receiver);
        prop_assert_eq!(sent.bucket.bucket().status(), expected);
        prop_assert_eq!(received.bucket.bucket().status(), expected);
        prop_assert!(sent.record.is_reciprocal_of(&received.record));
        prop_assert!(sent.record.is_sender() && received.record.is_receiver());
        prop_assert_eq!(sent.record.created_at, received.record.created_at);
        prop_assert_eq!(storage.store().len(), 2);

        // Every other bucket of both participants is empty.
        for (owner, current) in [(&x, placement.sender), (&y, placement.receiver)] {
            for bucket in Bucket::ALL {
                if bucket != current {
                    let size = storage
                        .store()
                        .size(&IdentityPath::of(owner).bucket(bucket))
                        .unwrap();
                    prop_assert_eq!(size, 0);
                }
            }
        }
    }

    #[test]
    fn prop_paging_is_a_window(offset in 0usize..8, limit in -1i64..8) {
        let mut directory = MemoryIdentityDirectory::new();
        let x = directory.register(Identity::new("x", "organization", "x"));
        let mut storage = RelationshipStorage::new(MemoryPathStore::new(), directory);

        for i in 0..5 {
            let peer = storage
                .directory_mut()
                .register(Identity::new(format!("peer-{}", i), "organization", format!("p{}", i)));
            storage
                .save_relationship(Relationship::new(x.clone(), peer, RelationshipStatus::Confirmed))
                .unwrap();
        }

        let all = storage.get_all_connections(&x).unwrap();
        let window = storage.get_connections(&x, offset, limit).unwrap();

        let end = if limit < 0 { all.len() } else { (offset + limit as usize).min(all.len()) };
        let expected: Vec<Identity> = all.iter().skip(offset).take(end.saturating_sub(offset)).cloned().collect();
        prop_assert_eq!(window, expected);
    }
}
