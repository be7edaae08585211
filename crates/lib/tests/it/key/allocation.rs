use orderable::order::Placement;

use crate::helpers::{assert_keys_increasing, posts_service};

#[tokio::test]
async fn test_repeated_insertion_triggers_exactly_one_rebalance() {
    // Two digits: 62 units between neighbouring leading digits
    let service = posts_service(2).await;
    let first = service.insert(Default::default(), Placement::End).await.unwrap();
    let last = service.insert(Default::default(), Placement::End).await.unwrap();
    assert_eq!(first.value.key().unwrap().as_str(), "V");
    assert_eq!(last.value.key().unwrap().as_str(), "W");

    let mut rebalanced_at = Vec::new();
    let mut inserted = Vec::new();
    for i in 0..10 {
        let committed = service
            .insert(Default::default(), Placement::After(first.id.clone()))
            .await
            .unwrap();
        if committed.rewritten > 0 {
            rebalanced_at.push(i);
        }
        assert!(committed.value.key().unwrap().len() <= 2);
        inserted.push(committed.id);
    }

    // Five halvings fit between V and W, the sixth insert rebalances and the
    // room it restores lasts for the rest of the run.
    assert_eq!(rebalanced_at, vec![5]);

    let domain = first.domain.clone();
    let mut expected = vec![first.id.clone()];
    expected.extend(inserted.into_iter().rev());
    expected.push(last.id.clone());
    assert_eq!(crate::helpers::ids_in(&service, &domain).await, expected);
    assert_keys_increasing(&service, &domain).await;
}

#[tokio::test]
async fn test_alternating_ends_never_rebalance_with_room() {
    let service = posts_service(8).await;
    let mut domain = None;
    for i in 0..40 {
        let placement = if i % 2 == 0 { Placement::Start } else { Placement::End };
        let committed = service.insert(Default::default(), placement).await.unwrap();
        assert_eq!(committed.rewritten, 0);
        domain = Some(committed.domain);
    }
    let domain = domain.unwrap();
    assert_eq!(service.list_ordered(&domain).await.unwrap().len(), 40);
    assert_keys_increasing(&service, &domain).await;
}
